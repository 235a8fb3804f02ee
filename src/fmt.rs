// Logging macros for media-transport
//
// With the `defmt` feature these forward to defmt. Without it the arguments
// are still evaluated by reference so call sites stay warning-free.

#![macro_use]
#![allow(unused_macros)]

// -----------------------------------------------------------------------------
// trace! - Very verbose: per-bit lock bookkeeping
// -----------------------------------------------------------------------------

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::trace!($s $(, $x)*);
            #[cfg(not(feature = "defmt"))]
            let _ = ($( & $x ),*);
        }
    };
}

// -----------------------------------------------------------------------------
// debug! - Owner lifecycle, completion routing
// -----------------------------------------------------------------------------

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::debug!($s $(, $x)*);
            #[cfg(not(feature = "defmt"))]
            let _ = ($( & $x ),*);
        }
    };
}

// -----------------------------------------------------------------------------
// info! - Descriptor ready, transport registered/removed
// -----------------------------------------------------------------------------

macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::info!($s $(, $x)*);
            #[cfg(not(feature = "defmt"))]
            let _ = ($( & $x ),*);
        }
    };
}

// -----------------------------------------------------------------------------
// warn! - Stale completions, dropped replies
// -----------------------------------------------------------------------------

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::warn!($s $(, $x)*);
            #[cfg(not(feature = "defmt"))]
            let _ = ($( & $x ),*);
        }
    };
}

// -----------------------------------------------------------------------------
// error! - Registration failures
// -----------------------------------------------------------------------------

macro_rules! error {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            #[cfg(feature = "defmt")]
            ::defmt::error!($s $(, $x)*);
            #[cfg(not(feature = "defmt"))]
            let _ = ($( & $x ),*);
        }
    };
}
