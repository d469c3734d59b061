mod users;
pub use users::*;

mod records;
pub use records::*;

mod categories;
pub use categories::*;

mod budgets;
pub use budgets::*;

mod stats;
pub use stats::*;

mod backup;
pub use backup::*;

use tally_accounting::datetime::Month;
use tally_data::RecordType;

/// The month given on the command line, or the current one.
pub(crate) fn month_arg(month: &Option<String>) -> Month {
    match month {
        Some(month) => Month::parse_or_current(month),
        None => Month::current(),
    }
}

pub(crate) fn record_type_arg(record_type: &Option<String>) -> anyhow::Result<Option<RecordType>> {
    match record_type {
        Some(t) => Ok(Some(t.parse().map_err(anyhow::Error::msg)?)),
        None => Ok(None),
    }
}
