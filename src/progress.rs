use log::info;

/// Logs how many items a loop has processed, at an exponentially thinning rate.
///
/// Reports every 1000 items until 5000, then every 10000 until 50000, and so on,
/// so a billion-record pass produces a few dozen lines.
pub struct Progress {
    label: &'static str,
    n: u64,
    step: u64,
}

impl Progress {
    pub fn new(label: &'static str) -> Self {
        Progress {
            label,
            n: 0,
            step: 1000,
        }
    }

    pub fn step(&mut self) {
        if self.n % self.step == 0 {
            info!("{} {}", self.label, unitize(self.n));
            if self.n / self.step >= 5 {
                self.step *= 10;
            }
        }
        self.n += 1;
    }

    pub fn count(&self) -> u64 {
        self.n
    }
}

/// Formats a count with a K/M/G suffix.
pub fn unitize(n: u64) -> String {
    for (scale, unit) in [(1e9, "G"), (1e6, "M"), (1e3, "K")] {
        if n as f64 >= scale {
            return format!("{:.0} {}", n as f64 / scale, unit);
        }
    }
    n.to_string()
}
