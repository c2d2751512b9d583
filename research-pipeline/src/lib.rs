// Model backends
pub mod backend;

// Progress tracking and rendering
pub mod progress;

// Research pipeline
pub mod research;

// Shared workflow helpers
pub mod workflow_utils;
