pub mod contributor_rates;
pub mod loan_history;
pub mod users;

pub use contributor_rates::Entity as ContributorRates;
pub use loan_history::Entity as LoanHistory;
pub use users::Entity as Users;

pub use loan_history::LoanStatus;
pub use users::Role;
