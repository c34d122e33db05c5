mod orchestrator_test;
mod reconciler_test;
