//! Entry point for inbound messages.
//!
//! Every message is first offered to pending dialogs and selections. If no session claims it, it
//! goes through the middleware pipeline and, if the pipeline produced a trigger, to the matching
//! command.

use tokio::task::JoinHandle;
use tracing::debug;

use crate::command::{Container, DispatchOutcome};
use crate::navi::ThreadSafeNavi;
use crate::platform::Message;

/// Handle one inbound message from the platform.
pub async fn handle_message(navi: ThreadSafeNavi, message: Message) -> DispatchOutcome {
    navi.metrics_handler.add_message();

    let message = match navi.sessions.offer(message) {
        Ok(()) => return DispatchOutcome::ConsumedBySession,
        Err(message) => message,
    };

    let container = navi.container_for(message);
    let Some(container) = navi.middleware.run(&navi, container).await else {
        navi.metrics_handler.add_middleware_abort();
        return DispatchOutcome::Aborted;
    };

    dispatch(&navi, container).await
}

/// Runs the command matching the container's trigger, skipping middleware.
pub async fn dispatch(navi: &ThreadSafeNavi, container: Container) -> DispatchOutcome {
    let Some(node) = navi.commands.find_command_by_name(&container.trigger) else {
        debug!("no command for trigger {:?}", container.trigger);
        return DispatchOutcome::Ignored;
    };

    navi.metrics_handler.add_command(node.name());
    node.execute(navi, container).await
}

/// Handles a message on its own task, so that a handler waiting on a dialog does not hold up the
/// message that answers it.
pub fn spawn_handle_message(navi: ThreadSafeNavi, message: Message) -> JoinHandle<DispatchOutcome> {
    tokio::spawn(handle_message(navi, message))
}
