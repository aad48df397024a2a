use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{AuditRecordedEvent, EventHandler, EventProducer, Handler, WinnerSettledEvent};

type BoxedHook<E> = dyn (Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static;

#[derive(Default, Clone)]
pub struct EventProducers {
    pub winner_settled_producer: Vec<EventProducer<WinnerSettledEvent>>,
    pub audit_recorded_producer: Vec<EventProducer<AuditRecordedEvent>>,
}

impl EventProducers {
    pub fn is_empty(&self) -> bool {
        self.winner_settled_producer.is_empty() && self.audit_recorded_producer.is_empty()
    }
}

pub struct EventHandlers {
    pub on_winner_settled: Option<EventHandler<WinnerSettledEvent>>,
    pub on_audit_recorded: Option<EventHandler<AuditRecordedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_winner_settled = hooks.on_winner_settled.map(|f| EventHandler::new(buffer_size, f));
        let on_audit_recorded = hooks.on_audit_recorded.map(|f| EventHandler::new(buffer_size, f));
        Self { on_winner_settled, on_audit_recorded }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_winner_settled {
            result.winner_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_audit_recorded {
            result.audit_recorded_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_winner_settled {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_audit_recorded {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_winner_settled: Option<Handler<WinnerSettledEvent>>,
    pub on_audit_recorded: Option<Handler<AuditRecordedEvent>>,
}

impl EventHooks {
    pub fn on_winner_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(WinnerSettledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        let hook: Arc<BoxedHook<WinnerSettledEvent>> = Arc::new(f);
        self.on_winner_settled = Some(hook);
        self
    }

    pub fn on_audit_recorded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(AuditRecordedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        let hook: Arc<BoxedHook<AuditRecordedEvent>> = Arc::new(f);
        self.on_audit_recorded = Some(hook);
        self
    }
}
