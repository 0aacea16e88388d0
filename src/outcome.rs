//! The terminal state of a future

/// The outcome of a future
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome<T, E> {
    /// The future has not been completed yet
    Pending,
    /// The computation produced a value
    Succeeded(T),
    /// The computation failed
    Failed(E),
    /// The future has been cancelled
    Cancelled,
}
impl<T, E> Outcome<T, E> {
    /// Converts from `&Outcome<T, E>` to `Outcome<&T, &E>`
    pub const fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Self::Pending => Outcome::Pending,
            Self::Succeeded(value) => Outcome::Succeeded(value),
            Self::Failed(error) => Outcome::Failed(error),
            Self::Cancelled => Outcome::Cancelled,
        }
    }

    /// Whether the outcome is still pending
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
    /// Whether the outcome is terminal (i.e. not pending anymore)
    pub const fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
    /// Whether the outcome is `Cancelled`
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Succeeded(value),
            Err(error) => Self::Failed(error),
        }
    }
}
