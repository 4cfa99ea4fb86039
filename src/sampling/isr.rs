use crate::sampling::Accumulator;
use core::cell::RefCell;
use critical_section::Mutex;

/// Used to initialize a global static [`Accumulator`] shared between a timer
/// interrupt (which pushes samples) and the main loop (which takes finished
/// windows).
///
/// # Returns
/// * An empty accumulator behind a `critical_section` mutex
///
/// # Example
/// ```rust
/// use core::cell::RefCell;
/// use loraport::critical_section::Mutex;
/// use loraport::sampling::{Accumulator, global_accumulator_init};
///
/// static CURRENT_SAMPLES: Mutex<RefCell<Accumulator>> = global_accumulator_init();
/// ```
pub const fn global_accumulator_init() -> Mutex<RefCell<Accumulator>> {
    Mutex::new(RefCell::new(Accumulator::new()))
}

/// Pushes one converted sample (in mV) from the timer interrupt.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn SAADC() {
///     let mv = CURRENT.raw_to_mv(read_result());
///     global_sample_push(&CURRENT_SAMPLES, mv);
/// }
/// ```
pub fn global_sample_push(global: &'static Mutex<RefCell<Accumulator>>, sample: f32) {
    critical_section::with(|cs| global.borrow(cs).borrow_mut().push(sample));
}

/// Takes the accumulated window and starts a new one, once at least
/// `min_samples` samples have been pushed.
///
/// Returns `None` (and keeps accumulating) while the window is still short.
pub fn global_sample_take(
    global: &'static Mutex<RefCell<Accumulator>>,
    min_samples: u32,
) -> Option<Accumulator> {
    critical_section::with(|cs| {
        let mut acc = global.borrow(cs).borrow_mut();
        if acc.count() < min_samples {
            return None;
        }
        Some(acc.take())
    })
}
