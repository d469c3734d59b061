
// Operations
mod operations;
pub use operations::*;

mod changes;
pub use changes::*;

mod validation;
pub use validation::*;

// Models
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
