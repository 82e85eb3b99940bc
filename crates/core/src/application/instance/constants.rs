// Consumer constants (No magic values)

/// Capacity of the bounded queue between the fan-out feeder and its workers
pub const FANOUT_QUEUE_CAPACITY: usize = 128;

/// Health message returned when every proxy address answers
pub const CONNECTIVITY_OK_MESSAGE: &str = "Successfully connected to the queue";

/// Health message prefix used when the connectivity probe fails
pub const CONNECTIVITY_ERROR_MESSAGE: &str = "Error connecting to the queue";
