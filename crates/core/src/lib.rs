pub mod expense;
pub mod intake;
pub mod locale;
pub mod money;
pub mod payee;
pub mod period;

pub use expense::{ExpenseRecord, RETAIL_EXPENSE_TYPE};
pub use intake::{IntakeReply, IntakeSession, IntakeStep};
pub use locale::{DayMonthFormatter, MonthNames};
pub use money::Money;
pub use payee::PayeeProfile;
pub use period::{parse_br_date, DateRange, PeriodError};
