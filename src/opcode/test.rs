use std::collections::HashSet;

use super::{BlockType, Instruction, MemArg, Opcode, UnknownOpcode};

#[test]
fn catalog_is_sorted_and_unique() {
    let bytes: Vec<u8> = Opcode::ALL.iter().map(|op| op.byte()).collect();
    let mut sorted = bytes.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(bytes, sorted);
    assert_eq!(Opcode::ALL.len(), 172);

    let mnemonics: HashSet<_> = Opcode::ALL.iter().map(|op| op.mnemonic()).collect();
    assert_eq!(mnemonics.len(), Opcode::ALL.len());
}

#[test]
fn bytes_are_stable() {
    assert_eq!(Opcode::Unreachable.byte(), 0x00);
    assert_eq!(Opcode::End.byte(), 0x0B);
    assert_eq!(Opcode::Call.byte(), 0x10);
    assert_eq!(Opcode::I32Const.byte(), 0x41);
    assert_eq!(Opcode::I32GtS.byte(), 0x4A);
    assert_eq!(Opcode::I64Add.byte(), 0x7C);
    assert_eq!(Opcode::I32TruncF32S.byte(), 0xA8);
    assert_eq!(Opcode::F64ReinterpretI64.byte(), 0xBF);
}

#[test]
fn lookup_by_byte() {
    for &op in Opcode::ALL {
        assert_eq!(Opcode::try_from(op.byte()), Ok(op));
    }
    assert_eq!(Opcode::try_from(0x06), Err(UnknownOpcode(0x06)));
    assert_eq!(Opcode::try_from(0xC0), Err(UnknownOpcode(0xC0)));
    assert_eq!(UnknownOpcode(0x06).to_string(), "Unknown opcode 0x06");
}

#[test]
fn canonical_instances_report_their_opcode() {
    for &op in Opcode::ALL {
        assert_eq!(op.canonical().opcode(), op);
    }
}

#[test]
fn same_marker_instructions_are_equal() {
    let a = Opcode::I32TruncF32S.canonical();
    let b = Instruction::I32TruncF32S;
    assert_eq!(a, b);
    assert_eq!(a.opcode(), b.opcode());

    let gt = Instruction::I32GtS;
    assert_eq!(gt, Opcode::I32GtS.canonical());
}

#[test]
fn different_markers_are_never_equal() {
    let markers: Vec<Instruction> = Opcode::ALL
        .iter()
        .filter(|op| op.is_marker())
        .map(|op| op.canonical())
        .collect();
    for (i, a) in markers.iter().enumerate() {
        for (j, b) in markers.iter().enumerate() {
            assert_eq!(i == j, a == b, "{} vs {}", a.mnemonic(), b.mnemonic());
        }
    }
}

#[test]
fn immediates() {
    assert!(Opcode::I32Add.is_marker());
    assert!(Opcode::Select.is_marker());
    assert!(!Opcode::I32Const.is_marker());
    assert_eq!(Opcode::BrTable.immediates(), &["targets", "default"]);
    assert_eq!(Opcode::I64Load8U.immediates(), &["memarg"]);
    assert!(Opcode::End.immediates().is_empty());
}

#[test]
fn canonical_operands_are_defaults() {
    assert_eq!(
        Opcode::Block.canonical(),
        Instruction::Block {
            ty: BlockType::Empty
        }
    );
    assert_eq!(
        Opcode::BrTable.canonical(),
        Instruction::BrTable {
            targets: vec![],
            default: 0
        }
    );
    assert_eq!(
        Opcode::I32Store.canonical(),
        Instruction::I32Store {
            memarg: MemArg::default()
        }
    );
    assert_eq!(Opcode::F64Const.canonical(), Instruction::F64Const { value: 0.0 });
}

#[test]
fn operands_take_part_in_equality() {
    let one = Instruction::I32Const { value: 1 };
    let two = Instruction::I32Const { value: 2 };
    assert_ne!(one, two);
    assert_eq!(one.opcode(), two.opcode());
}

#[test]
fn mnemonics() {
    assert_eq!(Opcode::I32TruncF32S.to_string(), "i32.trunc_f32_s");
    assert_eq!(Opcode::LocalGet.mnemonic(), "local.get");
    assert_eq!(Instruction::I32GtS.mnemonic(), "i32.gt_s");
}
