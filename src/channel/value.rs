//! # Envelope delivered by a channel.

use std::fmt;

use crate::context::Context;

/// One payload paired with the context snapshot captured when it was sent.
///
/// The context's [`sender`](Context::sender) names the routine that called
/// [`Channel::send`](crate::Channel::send); its routine, parent and key-values are those of
/// the sending side.
pub struct Value<T> {
    ctx: Context,
    data: T,
}

impl<T> Value<T> {
    pub(crate) fn new(ctx: Context, data: T) -> Self {
        Self { ctx, data }
    }

    /// Payload.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Context captured at send time.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Name of the routine that sent this value.
    pub fn sender(&self) -> &str {
        self.ctx.sender()
    }

    pub fn into_data(self) -> T {
        self.data
    }

    pub fn into_parts(self) -> (Context, T) {
        (self.ctx, self.data)
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("sender", &self.sender())
            .field("data", &self.data)
            .finish()
    }
}
