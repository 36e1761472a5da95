use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use fnhost_context::InvocationContext;
use fnhost_handler::{Handler, HandlerError, InvokeError};
use fnhost_protocol::{InvocationRequest, RequestReader, encode_response, write_line};
use parking_lot::Mutex;

use crate::capture::{StdoutCapture, StdoutPipe};
use crate::sink::{ChannelSink, SharedOutput};
use crate::{BridgeError, Result};

/// Sequential request/response loop over one resolved handler.
///
/// The next request is not read until the previous result frame has been
/// written and flushed, so results come back in request order.
pub struct InvocationLoop<R> {
	requests: RequestReader<R>,
	output: SharedOutput,
	log_output: SharedOutput,
	failures: Box<dyn Write>,
	handler: Box<dyn Handler>,
	capture: Option<StdoutCapture>,
	served: u64,
}

impl<R: BufRead> InvocationLoop<R> {
	/// `output` carries result frames and context log lines, `failures`
	/// receives the failure report when the loop ends on a handler failure.
	pub fn new(input: R, output: impl Write + Send + 'static, failures: impl Write + 'static, handler: Box<dyn Handler>) -> Self {
		let output: SharedOutput = Arc::new(Mutex::new(Box::new(output)));
		Self {
			requests: RequestReader::new(input),
			log_output: output.clone(),
			output,
			failures: Box::new(failures),
			handler,
			capture: None,
			served: 0,
		}
	}

	/// Forwards whatever the handler prints to `writer` from `pipe` into the
	/// output stream, guarded like context log lines. Each invocation's
	/// printed output is forwarded in full before its result frame.
	///
	/// Context log lines go through `writer` too, so they keep their place
	/// among printed lines.
	pub fn capture_stdout(mut self, pipe: StdoutPipe, writer: impl Write + Send + 'static) -> Result<Self> {
		let writer: SharedOutput = Arc::new(Mutex::new(Box::new(writer)));
		let capture = StdoutCapture::start(pipe, self.output.clone(), writer.clone()).map_err(fnhost_protocol::Error::Io)?;
		self.log_output = writer;
		self.capture = Some(capture);
		Ok(self)
	}

	/// Serves requests until end of input and returns how many were served.
	///
	/// Any error ends the loop. Failures caused by the handler are reported
	/// on the failure stream before returning.
	pub fn run(mut self) -> Result<u64> {
		match self.serve_all() {
			Ok(()) => Ok(self.served),
			Err(err) => {
				if let Some(report) = err.report() {
					if let Err(write_err) = write_line(&mut self.failures, &report.encode()) {
						tracing::warn!(error = %write_err, "failed to write failure report");
					}
				}
				Err(err)
			}
		}
	}

	fn serve_all(&mut self) -> Result<()> {
		while let Some(request) = self.requests.next_request()? {
			self.serve(request)?;
		}
		Ok(())
	}

	fn serve(&mut self, request: InvocationRequest) -> Result<()> {
		let context = InvocationContext::from_overrides(request.context).with_log_sink(Arc::new(ChannelSink::new(self.log_output.clone())));
		let span = tracing::debug_span!("invoke", request_id = %context.aws_request_id(), seq = self.served + 1);
		let _enter = span.enter();
		tracing::debug!(function = %context.function_name(), timeout_seconds = context.timeout_seconds(), "invoking handler");

		let handler = &mut self.handler;
		let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(request.event, &context)));
		if let Some(capture) = &mut self.capture {
			capture.drain().map_err(fnhost_protocol::Error::Io)?;
		}
		let result = match outcome {
			Ok(Ok(result)) => result,
			Ok(Err(InvokeError::Failed(err))) => return Err(BridgeError::Handler(err)),
			Ok(Err(InvokeError::Unserializable(err))) => return Err(BridgeError::Unserializable(err)),
			Err(payload) => return Err(BridgeError::Handler(HandlerError::panicked(payload.as_ref()))),
		};

		let frame = encode_response(result);
		write_line(&mut *self.output.lock(), &frame).map_err(fnhost_protocol::Error::Io)?;
		self.served += 1;
		tracing::debug!(remaining_ms = context.remaining_time_in_millis(), "result written");
		Ok(())
	}
}

impl<R> std::fmt::Debug for InvocationLoop<R> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InvocationLoop").field("served", &self.served).finish_non_exhaustive()
	}
}
