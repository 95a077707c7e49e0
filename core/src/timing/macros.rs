macro_rules! time_start {
    ( $start:ident ) => {
        #[cfg(feature = "timing")]
        let $start = std::time::Instant::now();
    };
}

macro_rules! time_record {
    ( $timers:expr, $timer:expr, $start:ident ) => {
        #[cfg(feature = "timing")]
        $timers.record($timer, $start.elapsed().as_nanos() as u64);
    };
}
