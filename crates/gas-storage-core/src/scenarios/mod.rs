pub mod sensitivity;

pub use sensitivity::{
    contract_sensitivity, ContractSensitivityInput, ContractSensitivityOutput, ContractVariable,
    SensitivityVariable,
};
