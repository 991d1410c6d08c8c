use crate::ports::InterpreterLock;

/// For callers that are not embedded in an interpreter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterpreterLock;

impl InterpreterLock for NoInterpreterLock {
    fn release(&self) {}

    fn reacquire(&self) {}
}
