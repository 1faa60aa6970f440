pub mod events;
pub mod request;
pub mod valuation;

pub use events::{merge_events, EventKind, ScheduledVolume, StorageEvent};
pub use request::{price_contract_request, ContractPricingRequest};
pub use valuation::{
    contract_net_value, price_contract, ContractParameters, ContractValuationInput,
    ContractValuationOutput, LedgerEntry,
};
