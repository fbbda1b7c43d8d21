//! Test suite for collabhub
//!
//! This module organizes all tests

pub mod property;
