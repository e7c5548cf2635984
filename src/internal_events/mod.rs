mod retries;
mod webhdfs;

pub use self::retries::*;
pub use self::webhdfs::*;

pub trait InternalEvent: Sized {
    fn emit(self);
}

pub fn emit(event: impl InternalEvent) {
    event.emit();
}

macro_rules! emit {
    ($event:expr) => {{
        #[cfg(test)]
        $crate::internal_events::record_internal_event(stringify!($event));
        $crate::internal_events::emit($event)
    }};
}

#[cfg(test)]
thread_local! {
    static EVENTS_RECORDED: std::cell::RefCell<std::collections::HashSet<String>> =
        std::cell::RefCell::new(Default::default());
}

#[cfg(test)]
pub fn record_internal_event(event: &str) {
    // Remove leading '&'
    let event = event.strip_prefix('&').unwrap_or(event);
    // Remove trailing '{fields…}'
    let event = event.find('{').map_or(event, |par| &event[..par]);

    EVENTS_RECORDED.with(|er| er.borrow_mut().insert(event.trim().into()));
}

/// Clears the events recorded on the current thread.
#[cfg(test)]
pub fn clear_recorded_events() {
    EVENTS_RECORDED.with(|er| er.borrow_mut().clear());
}

/// Whether an event with this type name was emitted on the current thread.
#[cfg(test)]
pub fn event_recorded(name: &str) -> bool {
    EVENTS_RECORDED.with(|er| er.borrow().contains(name))
}
