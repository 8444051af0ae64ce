//! Cross-subsystem scenarios: hierarchy edits flowing into collision queries

mod hierarchy_collision;
