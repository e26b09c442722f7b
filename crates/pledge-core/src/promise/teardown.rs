//! Release abandoned callback queues without recursion.
//!
//! A pending promise owns its registered callbacks, and those own the
//! downstream promises. Dropping the head of a long pending chain would free
//! it one stack frame per link. Instead, every queue released on a thread
//! while another release is running there is appended to that release's
//! worklist and freed by its loop.

use std::cell::RefCell;

use super::Queued;

thread_local! {
    static WORKLIST: RefCell<Option<Vec<Queued>>> = const { RefCell::new(None) };
}

pub(super) fn release(queued: Vec<Queued>) {
    if queued.is_empty() {
        return;
    }

    let outermost = WORKLIST.try_with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(pending) = slot.as_mut() {
            pending.extend(queued);
            false
        } else {
            *slot = Some(queued);
            true
        }
    });

    match outermost {
        Ok(true) => drain(),
        Ok(false) => {}
        // thread-local already destroyed: the queue was dropped with the
        // closure, nothing left to do
        Err(_) => {}
    }
}

fn drain() {
    loop {
        let next = WORKLIST.with(|slot| slot.borrow_mut().as_mut().and_then(Vec::pop));
        match next {
            // freed outside the borrow; nested releases land in the worklist
            Some(entry) => drop(entry),
            None => break,
        }
    }
    WORKLIST.with(|slot| *slot.borrow_mut() = None);
}
