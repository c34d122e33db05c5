mod application;
mod domain;
mod fixtures;
