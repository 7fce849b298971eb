//! # FFI Bindings
//!
//! Foreign Function Interface bindings for iOS and Android.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         FFI ARCHITECTURE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Swift/Kotlin                                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Platform Bindings                            │   │
//! │  │                                                                 │   │
//! │  │  iOS:      kilt_call (C FFI) → Swift wrapper                   │   │
//! │  │  Android:  KiltCore.call (JNI) → Kotlin wrapper                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              dispatch(method, JSON args) → JSON                 │   │
//! │  │                                                                 │   │
//! │  │  DID │ Paths │ Mnemonics │ Addresses │ Transactions            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! All FFI functions return results through:
//! - C FFI: `FfiResult` struct with error code and message
//! - JNI: a JSON envelope with `ok` and `data` or `error`
//!
//! Private keys never cross the boundary. Key pairs are re-derived inside
//! each call that needs to sign.

mod types;

mod dispatcher;

mod dispatch_address;

mod dispatch_did;

mod dispatch_tx;

mod c_api;

#[cfg(target_os = "android")]
mod jni;

pub use types::*;

pub use c_api::*;

pub use dispatcher::dispatch;
