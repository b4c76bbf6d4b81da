use crate::application::Dispatcher;

pub(crate) struct ServerState {
    dispatcher: Dispatcher,
}

impl ServerState {
    pub(crate) fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub(crate) fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
