use log::Level::Trace;
use log::{log_enabled, trace};

use crate::context::Context;
use crate::rule::Rule;
use crate::{util, LABEL, LOG_TARGET};

// one trace line per rule attempt/outcome; RUST_LOG=graft=trace to watch a
// grammar walk its input
pub(crate) trait Loggable {
    const LABEL_WIDTH: usize = 15;
    const INPUT_WIDTH: usize = 35;
    fn log_attempt(&self, rule: &Rule);
    fn log_success(&self, rule: &Rule);
    fn log_failure(&self, rule: &Rule);
}

impl Loggable for Context<'_> {
    fn log_attempt(&self, rule: &Rule) {
        if log_enabled!(target: LOG_TARGET, Trace) {
            trace!(
                target: LOG_TARGET,
                "{inp:<iw$} {label:<lw$} : try  {rule:?} @{pos}",
                iw = Self::INPUT_WIDTH,
                lw = Self::LABEL_WIDTH,
                label = LABEL.with(|l| l.borrow().clone()),
                inp = util::formatter_str(self.rest()),
                pos = self.progress(),
            );
        }
    }

    fn log_success(&self, rule: &Rule) {
        if log_enabled!(target: LOG_TARGET, Trace) {
            trace!(
                target: LOG_TARGET,
                "{inp:<iw$} {label:<lw$} : ok   {rule:?} @{pos}",
                iw = Self::INPUT_WIDTH,
                lw = Self::LABEL_WIDTH,
                label = LABEL.with(|l| l.borrow().clone()),
                inp = util::formatter_str(self.rest()),
                pos = self.progress(),
            );
        }
    }

    fn log_failure(&self, rule: &Rule) {
        if log_enabled!(target: LOG_TARGET, Trace) {
            trace!(
                target: LOG_TARGET,
                "{inp:<iw$} {label:<lw$} : fail {rule:?} @{pos}",
                iw = Self::INPUT_WIDTH,
                lw = Self::LABEL_WIDTH,
                label = LABEL.with(|l| l.borrow().clone()),
                inp = util::formatter_str(self.rest()),
                pos = self.progress(),
            );
        }
    }
}
