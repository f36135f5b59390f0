//! Unit tests for the services module.

mod controller;
