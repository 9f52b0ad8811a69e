//! Scenario tests driving the scheduler end to end

mod providers;
