use std::path::Path;

use anyhow::Context;
use storage_layout::{
    ast::SourceUnit,
    layout::{compute_layout, compute_layouts, ContractLayout, StorageType},
};

pub fn print_layouts(ast_path: &Path, contract: Option<&str>) -> anyhow::Result<()> {
    let unit = SourceUnit::from_file(ast_path)
        .with_context(|| format!("reading AST {}", ast_path.display()))?;

    let layouts = match contract {
        Some(name) => vec![compute_layout(&unit, name)?],
        None => compute_layouts(&unit)?,
    };

    for layout in &layouts {
        print!("{}", render_layout(layout));
    }
    Ok(())
}

fn render_layout(layout: &ContractLayout) -> String {
    let mut out = format!(
        "Contract: {} ({} slots)\n",
        layout.contract, layout.slots_used
    );

    for var in &layout.variables {
        out.push_str(&format!(
            "  Variable: {} @ slot {}, offset {}, {} bytes\n",
            var.name, var.slot, var.offset, var.size
        ));
        render_type(&var.storage_type, 2, &mut out);
    }
    out
}

fn render_type(storage_type: &StorageType, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);

    match storage_type {
        StorageType::Elementary(t) => out.push_str(&format!("{indent}Type: {t}\n")),
        StorageType::Mapping { key, value } => {
            out.push_str(&format!("{indent}Mapping:\n"));
            out.push_str(&format!("{indent}  Key Type:\n"));
            render_type(key, depth + 2, out);
            out.push_str(&format!("{indent}  Value Type:\n"));
            render_type(value, depth + 2, out);
        }
        StorageType::DynamicArray(base) => {
            out.push_str(&format!("{indent}Array of:\n"));
            render_type(base, depth + 1, out);
        }
        StorageType::FixedArray(base, len) => {
            out.push_str(&format!("{indent}Array[{len}] of:\n"));
            render_type(base, depth + 1, out);
        }
        StorageType::UserDefined => out.push_str(&format!("{indent}Type: {storage_type}\n")),
    }
}

#[cfg(test)]
mod tests {
    use storage_layout::{layout::StorageVariable, types::SolidityType};

    use super::*;

    #[test]
    fn renders_mapping_tree() {
        let layout = ContractLayout {
            contract: "City".to_string(),
            slots_used: 1,
            variables: vec![StorageVariable {
                name: "balances".to_string(),
                storage_type: StorageType::Mapping {
                    key: Box::new(StorageType::Elementary(SolidityType::Address)),
                    value: Box::new(StorageType::Elementary(SolidityType::Uint(256))),
                },
                slot: 0,
                offset: 0,
                size: 32,
            }],
        };

        assert_eq!(
            render_layout(&layout),
            "Contract: City (1 slots)\n\
             \x20 Variable: balances @ slot 0, offset 0, 32 bytes\n\
             \x20   Mapping:\n\
             \x20     Key Type:\n\
             \x20       Type: address\n\
             \x20     Value Type:\n\
             \x20       Type: uint256\n"
        );
    }
}
