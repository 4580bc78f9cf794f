//! C FFI layer for the emoji picker.
//!
//! This module provides a C-compatible interface for native frontends to
//! search emojis, read their keywords and record usage.
//!
//! Search results are returned as one space-separated string of emojis and
//! keywords as one semicolon-separated string. Every returned string must be
//! released with `emoji_picker_string_free()`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use crate::config::Config;
use crate::core::EmojiPicker;
use crate::error::{PickerError, PickerResult};

// ============================================================================
// FFI Functions
// ============================================================================

/// Create a new emoji picker.
///
/// `config_path` may be null to use the default configuration file.
/// Returns a pointer to the picker; the caller is responsible for calling
/// `emoji_picker_free()` to release it.
///
/// # Safety
/// `config_path` must be null or a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn emoji_picker_new(config_path: *const c_char) -> *mut EmojiPicker {
    let config = if config_path.is_null() {
        Config::load()
    } else {
        match c_str(config_path) {
            Ok(path) => Config::load_from(Path::new(path)),
            Err(e) => {
                tracing::error!("{}", e);
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(EmojiPicker::new(&config)))
}

/// Free an emoji picker.
///
/// Pending usage changes are not written; call `emoji_picker_flush()` first.
///
/// # Safety
/// The handle must be a valid pointer returned by `emoji_picker_new()`.
/// After calling this function, the handle is no longer valid.
#[no_mangle]
pub unsafe extern "C" fn emoji_picker_free(handle: *mut EmojiPicker) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Search for emojis.
///
/// # Arguments
/// * `handle` - A valid picker handle from `emoji_picker_new()`
/// * `filter` - The filter as a C string (UTF-8)
///
/// # Returns
/// Matching emojis separated by single spaces (empty if nothing matched), or
/// null on failure. The caller must free the string using
/// `emoji_picker_string_free()`.
///
/// # Safety
/// The handle must be valid and the filter must be a valid UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn emoji_picker_search(
    handle: *const EmojiPicker,
    filter: *const c_char,
) -> *mut c_char {
    if handle.is_null() || filter.is_null() {
        return ptr::null_mut();
    }

    let picker = &*handle;
    into_c_string(c_str(filter).and_then(|filter| picker.search_line(filter)))
}

/// Get the keywords of an emoji.
///
/// # Returns
/// Keywords separated by semicolons (empty for an unknown emoji), or null on
/// failure. The caller must free the string using `emoji_picker_string_free()`.
///
/// # Safety
/// The handle must be valid and the emoji must be a valid UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn emoji_picker_keywords(
    handle: *const EmojiPicker,
    emoji: *const c_char,
) -> *mut c_char {
    if handle.is_null() || emoji.is_null() {
        return ptr::null_mut();
    }

    let picker = &*handle;
    into_c_string(c_str(emoji).and_then(|emoji| picker.keywords_line(emoji)))
}

/// Record one use of an emoji. Returns false if the arguments are invalid.
///
/// # Safety
/// The handle must be valid and the emoji must be a valid UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn emoji_picker_record_usage(
    handle: *const EmojiPicker,
    emoji: *const c_char,
) -> bool {
    if handle.is_null() || emoji.is_null() {
        return false;
    }

    let picker = &*handle;
    match c_str(emoji) {
        Ok(emoji) => {
            picker.record_usage(emoji);
            true
        }
        Err(e) => {
            tracing::error!("{}", e);
            false
        }
    }
}

/// Write pending usage changes now. Returns false if the write failed.
///
/// # Safety
/// The handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn emoji_picker_flush(handle: *const EmojiPicker) -> bool {
    if handle.is_null() {
        return false;
    }

    let picker = &*handle;
    match picker.flush() {
        Ok(_) => true,
        Err(e) => {
            tracing::error!("{}", e);
            false
        }
    }
}

/// Free a string allocated by the FFI functions.
///
/// # Safety
/// The pointer must be a valid string returned by one of the FFI functions,
/// or null (which is safely ignored).
#[no_mangle]
pub unsafe extern "C" fn emoji_picker_string_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

/// Borrow a C string as UTF-8.
///
/// # Safety
/// `ptr` must be non-null and NUL-terminated.
unsafe fn c_str<'a>(ptr: *const c_char) -> PickerResult<&'a str> {
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| PickerError::InvalidInput(format!("not UTF-8: {}", e)))
}

fn into_c_string(result: PickerResult<String>) -> *mut c_char {
    let text = match result {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("{}", e);
            return ptr::null_mut();
        }
    };

    match CString::new(text) {
        Ok(s) => s.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}
