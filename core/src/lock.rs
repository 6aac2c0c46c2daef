//! Reader/writer lock with per-thread ownership.
//!
//! Any number of threads may hold the read side at once as long as no writer
//! holds the lock or is waiting for it. Once a writer is waiting, newly
//! arriving readers queue behind it, so a steady stream of searches cannot
//! starve an index merge.
//!
//! Ownership is tracked per thread:
//! - the writing thread may take the write side again (nested writes),
//! - the writing thread may take the read side without blocking on itself,
//! - a thread that already reads may read again even while a writer waits.
//!
//! Upgrading (read held, then write requested on the same thread) is not
//! supported and blocks forever.

use crate::error::LockError;
use parking_lot::{Condvar, Mutex};
use std::cell::UnsafeCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

#[derive(Default)]
struct LockState {
    readers: HashMap<ThreadId, usize>,
    writer: Option<ThreadId>,
    write_holds: usize,
    /// Read acquisitions made by the writer while it owns the write side.
    writer_reads: usize,
    waiting_writers: usize,
}

#[derive(Default)]
pub struct ReadWriteLock {
    state: Mutex<LockState>,
    changed: Condvar,
}

impl ReadWriteLock {
    pub fn new() -> Self { Self::default() }

    pub fn acquire_read(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer == Some(me) {
            state.writer_reads += 1;
            return;
        }
        if let Some(holds) = state.readers.get_mut(&me) {
            *holds += 1;
            return;
        }
        while state.writer.is_some() || state.waiting_writers > 0 {
            self.changed.wait(&mut state);
        }
        state.readers.insert(me, 1);
    }

    pub fn release_read(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer == Some(me) && state.writer_reads > 0 {
            state.writer_reads -= 1;
            return Ok(());
        }
        match state.readers.get_mut(&me) {
            Some(holds) if *holds > 1 => {
                *holds -= 1;
                Ok(())
            }
            Some(_) => {
                state.readers.remove(&me);
                if state.readers.is_empty() {
                    self.changed.notify_all();
                }
                Ok(())
            }
            None => Err(LockError::NotReading),
        }
    }

    pub fn acquire_write(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer == Some(me) {
            state.write_holds += 1;
            return;
        }
        state.waiting_writers += 1;
        while state.writer.is_some() || !state.readers.is_empty() {
            self.changed.wait(&mut state);
        }
        state.waiting_writers -= 1;
        state.writer = Some(me);
        state.write_holds = 1;
    }

    pub fn release_write(&self) -> Result<(), LockError> {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer != Some(me) {
            return Err(LockError::NotWriting);
        }
        state.write_holds -= 1;
        if state.write_holds == 0 {
            state.writer = None;
            // reads taken under the write side outlive it as ordinary reads
            let carried = std::mem::take(&mut state.writer_reads);
            if carried > 0 {
                state.readers.insert(me, carried);
            }
            self.changed.notify_all();
        }
        Ok(())
    }

    /// Acquires the read side for the lifetime of the returned guard.
    pub fn read(&self) -> ReadGuard<'_> {
        self.acquire_read();
        ReadGuard { lock: self, _not_send: PhantomData }
    }

    /// Acquires the write side for the lifetime of the returned guard.
    pub fn write(&self) -> WriteGuard<'_> {
        self.acquire_write();
        WriteGuard { lock: self, _not_send: PhantomData }
    }

    pub fn is_write_locked_by_current_thread(&self) -> bool {
        self.state.lock().writer == Some(thread::current().id())
    }

    pub fn is_write_locked(&self) -> bool { self.state.lock().writer.is_some() }

    /// Number of distinct threads currently holding the read side.
    pub fn reader_count(&self) -> usize { self.state.lock().readers.len() }
}

/// Guards are tied to the acquiring thread, so they are neither `Send` nor `Sync`.
pub struct ReadGuard<'a> {
    lock: &'a ReadWriteLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.release_read() {
            tracing::error!(%err, "read guard released without holding the lock");
        }
    }
}

pub struct WriteGuard<'a> {
    lock: &'a ReadWriteLock,
    _not_send: PhantomData<*const ()>,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.release_write() {
            tracing::error!(%err, "write guard released without holding the lock");
        }
    }
}

/// A value only reachable through a [`ReadWriteLock`].
///
/// Access is closure-scoped. Closures must not call back into the same
/// `Guarded`: a nested read inside `write` would alias the `&mut`.
pub(crate) struct Guarded<T> {
    lock: ReadWriteLock,
    value: UnsafeCell<T>,
}

// SAFETY: shared access hands out `&T` only under the read side and `&mut T`
// only under the exclusive write side; callers never nest accesses.
unsafe impl<T: Send + Sync> Sync for Guarded<T> {}

impl<T> Guarded<T> {
    pub(crate) fn new(value: T) -> Self {
        Self { lock: ReadWriteLock::new(), value: UnsafeCell::new(value) }
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        assert!(!self.lock.is_write_locked_by_current_thread(), "nested access to guarded value");
        let _guard = self.lock.read();
        // SAFETY: no writer holds the lock while the read side is held.
        f(unsafe { &*self.value.get() })
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        assert!(!self.lock.is_write_locked_by_current_thread(), "nested access to guarded value");
        let _guard = self.lock.write();
        // SAFETY: the write side excludes every reader and every other writer.
        f(unsafe { &mut *self.value.get() })
    }

    pub(crate) fn into_inner(self) -> T { self.value.into_inner() }
}
