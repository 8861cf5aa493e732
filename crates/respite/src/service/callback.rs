// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Clonable, thread-safe wrappers for user callbacks stored in the retry layer.

use super::{OnExhaustedArgs, OnRetryArgs, RecoveryArgs};
use recoverable::RecoveryInfo;

/// Declares a `pub(crate)` newtype over `Arc<dyn Fn(..) -> R + Send + Sync>` with `new`, `call`,
/// `Clone` and an opaque `Debug`.
///
/// ```rust,ignore
/// callback!(ShouldRecover<Out>(Fn(out: &Out, args: RecoveryArgs) -> RecoveryInfo));
/// callback!(OnRetry<Out>(Fn(out: &Out, args: OnRetryArgs)));
/// ```
macro_rules! callback {
    ($name:ident<$($generics:ident),*>(Fn($($param_name:ident: $param_ty:ty),*) -> $return_ty:ty)) => {
        pub(crate) struct $name<$($generics),*>(std::sync::Arc<dyn Fn($($param_ty),*) -> $return_ty + Send + Sync>);

        impl<$($generics),*> $name<$($generics),*> {
            pub(crate) fn new<F>(callback: F) -> Self
            where
                F: Fn($($param_ty),*) -> $return_ty + Send + Sync + 'static,
            {
                Self(std::sync::Arc::new(callback))
            }

            pub(crate) fn call(&self, $($param_name: $param_ty),*) -> $return_ty {
                (self.0)($($param_name),*)
            }
        }

        impl<$($generics),*> Clone for $name<$($generics),*> {
            fn clone(&self) -> Self {
                Self(std::sync::Arc::clone(&self.0))
            }
        }

        impl<$($generics),*> std::fmt::Debug for $name<$($generics),*> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish()
            }
        }
    };

    ($name:ident<$($generics:ident),*>(Fn($($param_name:ident: $param_ty:ty),*))) => {
        callback!($name<$($generics),*>(Fn($($param_name: $param_ty),*) -> ()));
    };
}

callback!(ShouldRecover<Out>(Fn(out: &Out, args: RecoveryArgs<'_>) -> RecoveryInfo));
callback!(OnRetry<Out>(Fn(out: &Out, args: OnRetryArgs)));
callback!(OnExhausted<Out>(Fn(out: &Out, args: OnExhaustedArgs)));
