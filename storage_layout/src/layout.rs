use std::fmt;

use ethers::{
    types::{H256, U256},
    utils::keccak256,
};

use crate::{
    ast::{SourceUnit, StateVariable, TypeName},
    types::SolidityType,
    LayoutError,
};

const SLOT_BYTES: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageType {
    Elementary(SolidityType),
    Mapping {
        key: Box<StorageType>,
        value: Box<StorageType>,
    },
    DynamicArray(Box<StorageType>),
    FixedArray(Box<StorageType>, usize),
    /// Struct, enum or contract type. Only accepted where its own size never
    /// reaches the declaration slot: mapping keys and values, dynamic array
    /// elements.
    UserDefined,
}

impl StorageType {
    pub fn from_type_name(type_name: &TypeName, variable: &str) -> Result<Self, LayoutError> {
        Ok(match type_name {
            TypeName::ElementaryTypeName { name } => StorageType::Elementary(name.parse()?),
            TypeName::Mapping {
                key_type,
                value_type,
            } => StorageType::Mapping {
                key: Box::new(Self::hashed_from_type_name(key_type, variable)?),
                value: Box::new(Self::hashed_from_type_name(value_type, variable)?),
            },
            TypeName::ArrayTypeName {
                base_type,
                length: None,
            } => StorageType::DynamicArray(Box::new(Self::hashed_from_type_name(
                base_type, variable,
            )?)),
            TypeName::ArrayTypeName {
                base_type,
                length: Some(length),
            } => {
                let base = Box::new(Self::from_type_name(base_type, variable)?);
                let len = length
                    .as_usize()
                    .ok_or_else(|| LayoutError::UnsupportedType(variable.to_owned()))?;
                StorageType::FixedArray(base, len)
            }
            TypeName::UserDefined => {
                return Err(LayoutError::UnsupportedType(variable.to_owned()))
            }
        })
    }

    /// Types stored under a keccak-derived slot: any user-defined type goes.
    fn hashed_from_type_name(type_name: &TypeName, variable: &str) -> Result<Self, LayoutError> {
        match type_name {
            TypeName::UserDefined => Ok(StorageType::UserDefined),
            other => Self::from_type_name(other, variable),
        }
    }

    /// Number of whole slots the type reserves at its declaration site, or
    /// `None` if that does not fit in a `u64`.
    pub fn slot_count(&self) -> Option<u64> {
        match self {
            StorageType::FixedArray(base, len) => {
                let len = u64::try_from(*len).ok()?;
                match base.as_ref() {
                    StorageType::Elementary(t) if !t.is_dynamic() => {
                        let per_slot = (SLOT_BYTES / t.size_bytes()) as u64;
                        Some(len.div_ceil(per_slot))
                    }
                    other => len.checked_mul(other.slot_count()?),
                }
            }
            _ => Some(1),
        }
    }

    /// Bytes occupied at the declaration site.
    pub fn size_bytes(&self) -> Option<usize> {
        match self {
            StorageType::Elementary(t) => Some(t.size_bytes()),
            StorageType::FixedArray(..) => usize::try_from(self.slot_count()?)
                .ok()?
                .checked_mul(SLOT_BYTES),
            _ => Some(SLOT_BYTES),
        }
    }

    /// Arrays start a fresh slot and push whatever follows into a fresh one.
    fn isolates_slot(&self) -> bool {
        matches!(
            self,
            StorageType::FixedArray(..) | StorageType::DynamicArray(_) | StorageType::Mapping { .. }
        )
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Elementary(t) => write!(f, "{t}"),
            StorageType::Mapping { key, value } => write!(f, "mapping({key} => {value})"),
            StorageType::DynamicArray(base) => write!(f, "{base}[]"),
            StorageType::FixedArray(base, len) => write!(f, "{base}[{len}]"),
            StorageType::UserDefined => f.write_str("<user-defined>"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageVariable {
    pub name: String,
    pub storage_type: StorageType,
    pub slot: u64,
    /// Byte offset from the right of the slot.
    pub offset: usize,
    pub size: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractLayout {
    pub contract: String,
    pub variables: Vec<StorageVariable>,
    pub slots_used: u64,
}

impl ContractLayout {
    pub fn variable(&self, name: &str) -> Option<&StorageVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// Assign slots to `variables` in declaration order, packing value types
/// that fit into the current slot.
pub fn layout_variables(
    contract: &str,
    variables: &[StateVariable<'_>],
) -> Result<ContractLayout, LayoutError> {
    let mut slot = 0u64;
    let mut offset = 0usize;
    let mut laid_out = Vec::with_capacity(variables.len());

    for var in variables {
        let type_name = var
            .type_name
            .ok_or_else(|| LayoutError::UnsupportedType(var.name.to_owned()))?;
        let storage_type = StorageType::from_type_name(type_name, var.name)?;
        let overflow = || LayoutError::SlotOverflow(var.name.to_owned());
        let size = storage_type.size_bytes().ok_or_else(overflow)?;
        let isolated = storage_type.isolates_slot();

        if offset != 0 && (isolated || offset + size > SLOT_BYTES) {
            slot = slot.checked_add(1).ok_or_else(overflow)?;
            offset = 0;
        }

        laid_out.push(StorageVariable {
            name: var.name.to_owned(),
            storage_type: storage_type.clone(),
            slot,
            offset,
            size,
        });

        if isolated || size >= SLOT_BYTES {
            slot = storage_type
                .slot_count()
                .and_then(|count| slot.checked_add(count))
                .ok_or_else(overflow)?;
            offset = 0;
        } else {
            offset += size;
        }
    }

    let slots_used = slot
        .checked_add(u64::from(offset != 0))
        .ok_or_else(|| LayoutError::SlotOverflow(contract.to_owned()))?;

    Ok(ContractLayout {
        contract: contract.to_owned(),
        variables: laid_out,
        slots_used,
    })
}

pub fn compute_layouts(unit: &SourceUnit) -> Result<Vec<ContractLayout>, LayoutError> {
    unit.contracts()
        .map(|(name, vars)| layout_variables(name, &vars))
        .collect()
}

pub fn compute_layout(unit: &SourceUnit, contract: &str) -> Result<ContractLayout, LayoutError> {
    let (name, vars) = unit
        .contracts()
        .find(|(name, _)| *name == contract)
        .ok_or_else(|| LayoutError::ContractNotFound(contract.to_owned()))?;
    layout_variables(name, &vars)
}

fn slot_word(slot: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    slot.to_big_endian(&mut word);
    word
}

/// Where `mapping[key]` lives for a mapping declared at `slot`.
/// `key` must already be padded to a word the way the EVM pads it.
pub fn mapping_value_slot(key: &[u8; 32], slot: U256) -> H256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(key);
    preimage[32..].copy_from_slice(&slot_word(slot));
    H256::from(keccak256(preimage))
}

/// First element slot of a dynamic array declared at `slot`.
pub fn dynamic_array_data_slot(slot: U256) -> H256 {
    H256::from(keccak256(slot_word(slot)))
}
