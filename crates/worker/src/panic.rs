use tokio::task::JoinError;

/// Extracts the panic payload message from a failed join.
///
/// Returns `None` when the task was cancelled rather than panicking, or when
/// the payload is neither `&str` nor `String`.
pub fn join_error_panic_message(err: JoinError) -> Option<String> {
	let payload = err.try_into_panic().ok()?;
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return Some((*msg).to_string());
	}
	payload.downcast::<String>().ok().map(|msg| *msg)
}
