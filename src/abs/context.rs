//! Ownership of the rendering context.
//!
//! The GPU state lives on one thread. [`RenderContext`] remembers which thread
//! that is and refuses device access from anywhere else. Other threads that
//! need something from the render thread go through a [`RequestSender`]: the
//! request is queued, the render thread runs it while servicing its
//! [`RequestQueue`], and the caller blocks until the answer arrives.

use std::{
    sync::mpsc,
    thread::{self, ThreadId},
};

use crate::{
    abs::GraphicsDevice,
    error::{RenderError, RenderResult},
};

/// A graphics device bound to the thread that created it.
pub struct RenderContext<D> {
    device: D,
    owner: ThreadId,
}

impl<D: GraphicsDevice> RenderContext<D> {
    /// Takes ownership of `device`, binding it to the calling thread.
    pub fn new(device: D) -> Self {
        Self {
            device,
            owner: thread::current().id(),
        }
    }

    pub fn is_render_thread(&self) -> bool {
        thread::current().id() == self.owner
    }

    pub fn ensure_render_thread(&self) -> RenderResult<()> {
        if self.is_render_thread() {
            return Ok(());
        }
        let current = thread::current();
        Err(RenderError::ThreadAffinity(format!(
            "{} ({:?})",
            current.name().unwrap_or("<unnamed>"),
            current.id()
        )))
    }

    /// The device, if called on the render thread.
    pub fn device(&self) -> RenderResult<&D> {
        self.ensure_render_thread()?;
        Ok(&self.device)
    }

    /// Creates a channel through which other threads can run closures on the
    /// render thread.
    pub fn request_channel(&self) -> (RequestSender<D>, RequestQueue<D>) {
        let (sender, receiver) = mpsc::channel();
        (
            RequestSender {
                sender,
                owner: self.owner,
            },
            RequestQueue { receiver },
        )
    }
}

type Request<D> = Box<dyn FnOnce(&RenderContext<D>) + Send>;

/// Sending half of a request channel. Cheap to clone and `Send`.
pub struct RequestSender<D> {
    sender: mpsc::Sender<Request<D>>,
    owner: ThreadId,
}

impl<D> Clone for RequestSender<D> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            owner: self.owner,
        }
    }
}

impl<D: 'static> RequestSender<D> {
    /// Runs `request` on the render thread and blocks until it returns.
    ///
    /// There is no timeout. The call fails only if the queue was dropped, or if
    /// it is made from the render thread itself, which would wait forever.
    pub fn request<T, F>(&self, request: F) -> RenderResult<T>
    where
        F: FnOnce(&RenderContext<D>) -> T + Send + 'static,
        T: Send + 'static,
    {
        if thread::current().id() == self.owner {
            return Err(RenderError::state(
                "requests can not be made from the render thread itself",
            ));
        }

        let (reply, response) = mpsc::sync_channel(1);
        self.sender
            .send(Box::new(move |context| {
                let _ = reply.send(request(context));
            }))
            .map_err(|_| RenderError::ContextClosed)?;
        response.recv().map_err(|_| RenderError::ContextClosed)
    }
}

/// Receiving half of a request channel, serviced by the render thread.
pub struct RequestQueue<D> {
    receiver: mpsc::Receiver<Request<D>>,
}

impl<D: GraphicsDevice> RequestQueue<D> {
    /// Runs every queued request. Returns how many were handled.
    pub fn process(&self, context: &RenderContext<D>) -> RenderResult<usize> {
        context.ensure_render_thread()?;
        let mut handled = 0;
        while let Ok(request) = self.receiver.try_recv() {
            request(context);
            handled += 1;
        }
        Ok(handled)
    }
}
