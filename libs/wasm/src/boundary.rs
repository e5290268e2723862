//! # Raw Host Boundary
//!
//! Allocate/transfer/free protocol for hosts that drive the module through
//! its raw exports instead of generated bindings:
//!
//! ```text
//! ptr = alloc_input(len)        copy source bytes into ptr
//! out = lint_source(ptr, len)   null on a boundary fault
//! n   = result_len()            copy n bytes out of out
//! free_result(out, n)           free_input(ptr, len)
//! ```
//!
//! On a null result, `last_error_ptr`/`last_error_len` describe the fault.
//! Every buffer crosses the boundary as a [`RentedBuffer`], so each
//! allocation has exactly one matching release.

use ruby_lint::{codec, LintError, LintOptions};
use std::cell::{Cell, RefCell};
use std::ptr;
use thiserror::Error;

// =============================================================================
// ERRORS
// =============================================================================

/// Faults that prevent a report from being produced at all.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("input pointer is null")]
    NullInput,

    #[error("source is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    #[error("report encoding failed: {0}")]
    Encode(serde_json::Error),
}

impl From<LintError> for BoundaryError {
    fn from(error: LintError) -> Self {
        match error {
            LintError::InvalidUtf8 { valid_up_to } => Self::InvalidUtf8 { valid_up_to },
            LintError::Encode(source) => Self::Encode(source),
        }
    }
}

// =============================================================================
// RENTED BUFFER
// =============================================================================

/// A byte buffer whose ownership is lent to the host.
///
/// [`RentedBuffer::into_raw`] hands the allocation out; the host must give
/// the same pointer and length back to [`RentedBuffer::from_raw`].
#[derive(Debug)]
pub struct RentedBuffer {
    bytes: Box<[u8]>,
}

impl RentedBuffer {
    /// Zero-filled buffer of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self { bytes: vec![0; len].into_boxed_slice() }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lend the allocation out.
    pub fn into_raw(self) -> *mut u8 {
        Box::into_raw(self.bytes).cast::<u8>()
    }

    /// Take back an allocation lent by [`RentedBuffer::into_raw`].
    ///
    /// Returns `None` for a null pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `into_raw` on a buffer of exactly `len` bytes
    /// and must not have been reclaimed already.
    pub unsafe fn from_raw(ptr: *mut u8, len: usize) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        let bytes = Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len));
        Some(Self { bytes })
    }
}

impl From<Vec<u8>> for RentedBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes: bytes.into_boxed_slice() }
    }
}

// =============================================================================
// CALL STATE
// =============================================================================

// Only the length of the latest result and the latest fault live here.
// The engine never reads them.
thread_local! {
    static RESULT_LEN: Cell<usize> = const { Cell::new(0) };
    static LAST_ERROR: RefCell<Vec<u8>> = const { RefCell::new(Vec::new()) };
}

fn record_error(error: &BoundaryError) {
    LAST_ERROR.with_borrow_mut(|message| {
        message.clear();
        message.extend_from_slice(error.to_string().as_bytes());
    });
}

fn clear_error() {
    LAST_ERROR.with_borrow_mut(Vec::clear);
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Lint UTF-8 source bytes into JSON report bytes.
pub fn lint_encoded(source: &[u8], options: LintOptions) -> Result<Vec<u8>, BoundaryError> {
    let result = ruby_lint::lint_bytes(source, options)?;
    Ok(codec::encode_bytes(&result)?)
}

/// Run one call and lend the result out, or record the fault and return null.
///
/// # Safety
///
/// A non-null `ptr` must be readable for `len` bytes.
unsafe fn lint_raw(ptr: *const u8, len: usize, options: LintOptions) -> *mut u8 {
    let outcome = if ptr.is_null() {
        Err(BoundaryError::NullInput)
    } else {
        lint_encoded(std::slice::from_raw_parts(ptr, len), options)
    };

    match outcome {
        Ok(bytes) => {
            clear_error();
            let buffer = RentedBuffer::from(bytes);
            RESULT_LEN.set(buffer.len());
            buffer.into_raw()
        }
        Err(error) => {
            tracing::debug!(%error, "boundary fault");
            record_error(&error);
            RESULT_LEN.set(0);
            ptr::null_mut()
        }
    }
}

// =============================================================================
// EXPORTS
// =============================================================================

/// Allocate an input buffer of `len` bytes for the host to fill.
#[no_mangle]
pub extern "C" fn alloc_input(len: usize) -> *mut u8 {
    RentedBuffer::zeroed(len).into_raw()
}

/// Release a buffer from [`alloc_input`].
///
/// # Safety
///
/// `ptr`/`len` must be exactly what `alloc_input` returned and received.
#[no_mangle]
pub unsafe extern "C" fn free_input(ptr: *mut u8, len: usize) {
    drop(RentedBuffer::from_raw(ptr, len));
}

/// Lint `len` bytes at `ptr`; returns the JSON report or null on a fault.
///
/// # Safety
///
/// A non-null `ptr` must be readable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn lint_source(ptr: *const u8, len: usize) -> *mut u8 {
    lint_raw(ptr, len, LintOptions::default())
}

/// Like [`lint_source`], with the parse dump attached.
///
/// # Safety
///
/// A non-null `ptr` must be readable for `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn lint_source_with_dump(ptr: *const u8, len: usize) -> *mut u8 {
    lint_raw(ptr, len, LintOptions::default().with_parse_dump(true))
}

/// Length of the buffer returned by the latest lint call on this thread.
#[no_mangle]
pub extern "C" fn result_len() -> usize {
    RESULT_LEN.get()
}

/// Release a result buffer.
///
/// # Safety
///
/// `ptr` must come from `lint_source*` and `len` from the matching
/// `result_len`.
#[no_mangle]
pub unsafe extern "C" fn free_result(ptr: *mut u8, len: usize) {
    drop(RentedBuffer::from_raw(ptr, len));
}

/// Message of the latest fault; valid until the next lint call.
#[no_mangle]
pub extern "C" fn last_error_ptr() -> *const u8 {
    LAST_ERROR.with_borrow(|message| message.as_ptr())
}

#[no_mangle]
pub extern "C" fn last_error_len() -> usize {
    LAST_ERROR.with_borrow(Vec::len)
}
