//! Typed AST accessors over the rowan view.

use huff::huff::ast::{BodyItem, Declared, Definition};
use huff::huff::parse_typed;

use crate::helpers::fixtures::TOKEN;

fn token_file() -> huff::huff::ast::SourceFile {
    let parse = parse_typed(TOKEN);
    assert!(parse.ok(), "{:?}", parse.errors);
    parse.source_file().unwrap()
}

#[test]
fn test_definitions_in_order() {
    let file = token_file();
    let definitions: Vec<_> = file.definitions().collect();
    assert!(matches!(definitions.first(), Some(Definition::Import(_))));
    assert!(matches!(definitions.last(), Some(Definition::Declaration(_))));
    assert!(
        definitions
            .iter()
            .any(|definition| matches!(definition, Definition::Decorator(_)))
    );

    let names: Vec<_> = file
        .declarations()
        .filter_map(|declaration| declaration.name())
        .collect();
    assert_eq!(
        names,
        [
            "transfer",
            "balanceOf",
            "Transfer",
            "Unauthorized",
            "BALANCE_SLOT",
            "MAX_SUPPLY",
            "SELECTORS",
            "CODE_TABLE",
            "ONLY_OWNER",
            "ADD",
            "MAIN",
            "TEST_ADD",
        ]
    );
}

#[test]
fn test_import_path_is_unquoted() {
    let file = token_file();
    let Some(Definition::Import(import)) = file.definitions().next() else {
        panic!("expected an import first");
    };
    assert_eq!(import.path().as_deref(), Some("./utils/Ownable.huff"));
}

#[test]
fn test_macros() {
    let file = token_file();
    let names: Vec<_> = file.macros().filter_map(|item| item.name()).collect();
    assert_eq!(names, ["ONLY_OWNER", "ADD", "MAIN"]);

    let add = file.find_macro("ADD").unwrap();
    assert!(add.is_fn());
    assert_eq!(add.parameters(), ["a", "b"]);
    assert_eq!(add.takes().as_deref(), Some("0"));
    assert_eq!(add.returns().as_deref(), Some("1"));
    let items: Vec<_> = add.body().unwrap().items().collect();
    assert_eq!(
        items,
        [
            BodyItem::Parameter("a".into()),
            BodyItem::Parameter("b".into()),
            BodyItem::Opcode("add".into()),
        ]
    );

    let main = file.find_macro("MAIN").unwrap();
    assert!(!main.is_fn());
    assert!(main.parameters().is_empty());
    assert!(file.find_macro("MISSING").is_none());
}

#[test]
fn test_macro_body_items() {
    let file = token_file();
    let owner = file.find_macro("ONLY_OWNER").unwrap();
    let items: Vec<_> = owner.body().unwrap().items().collect();
    assert_eq!(
        items,
        [
            BodyItem::Constant("OWNER".into()),
            BodyItem::Opcode("sload".into()),
            BodyItem::Opcode("caller".into()),
            BodyItem::Opcode("eq".into()),
            BodyItem::Jumpdest("is_owner".into()),
            BodyItem::Opcode("jumpi".into()),
            BodyItem::Number("0x00".into()),
            BodyItem::Opcode("dup1".into()),
            BodyItem::Opcode("revert".into()),
            BodyItem::Label("is_owner".into()),
        ]
    );
}

#[test]
fn test_calls_and_builtins() {
    let file = token_file();
    let main = file.find_macro("MAIN").unwrap();
    let items: Vec<_> = main.body().unwrap().items().collect();

    let calls: Vec<_> = items
        .iter()
        .filter_map(|item| match item {
            BodyItem::Call(call) => Some((call.name().unwrap(), call.args())),
            _ => None,
        })
        .collect();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "ONLY_OWNER");
    assert!(calls[0].1.is_empty());
    assert_eq!(calls[1].0, "ADD");
    assert_eq!(calls[1].1, ["0x01", "MAX_SUPPLY"]);

    let builtins: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            BodyItem::Builtin(builtin) => Some(format!("{}({})", builtin.name()?, builtin.arg()?)),
            _ => None,
        })
        .collect();
    assert_eq!(
        builtins,
        [
            "__FUNC_SIG(transfer)",
            "__FUNC_SIG(balanceOf(address))",
            "__tablesize(CODE_TABLE)",
            "__tablestart(CODE_TABLE)",
        ]
    );
}

#[test]
fn test_abi_declarations() {
    let file = token_file();
    let mut functions = Vec::new();
    let mut events = Vec::new();
    let mut errors = Vec::new();
    for declaration in file.declarations() {
        match declaration.item() {
            Some(Declared::Function(function)) => functions.push(function),
            Some(Declared::Event(event)) => events.push(event),
            Some(Declared::Error(error)) => errors.push(error),
            _ => {}
        }
    }

    let transfer = &functions[0];
    assert_eq!(transfer.name().as_deref(), Some("transfer"));
    assert_eq!(transfer.visibility().as_deref(), Some("nonpayable"));
    let inputs: Vec<_> = transfer
        .inputs()
        .unwrap()
        .parameters()
        .filter_map(|parameter| parameter.ty())
        .collect();
    assert_eq!(inputs, ["address", "uint256"]);
    let outputs: Vec<_> = transfer
        .outputs()
        .unwrap()
        .parameters()
        .filter_map(|parameter| parameter.ty())
        .collect();
    assert_eq!(outputs, ["bool"]);
    assert_eq!(functions[1].visibility().as_deref(), Some("view"));

    let event = &events[0];
    let locations: Vec<String> = event
        .parameters()
        .unwrap()
        .parameters()
        .map(|parameter| {
            parameter
                .location()
                .map(|location| location.to_string())
                .unwrap_or_default()
        })
        .collect();
    assert_eq!(locations, ["indexed", "indexed", ""]);

    assert_eq!(errors[0].name().as_deref(), Some("Unauthorized"));
    assert_eq!(errors[0].parameters().unwrap().parameters().count(), 1);
}

#[test]
fn test_constants_tables_and_tests() {
    let file = token_file();
    let mut constants = Vec::new();
    let mut jumptables = Vec::new();
    let mut tables = Vec::new();
    let mut tests = Vec::new();
    for declaration in file.declarations() {
        match declaration.item() {
            Some(Declared::Constant(constant)) => constants.push(constant),
            Some(Declared::Jumptable(jumptable)) => jumptables.push(jumptable),
            Some(Declared::Table(table)) => tables.push(table),
            Some(Declared::Test(test)) => tests.push(test),
            _ => {}
        }
    }

    assert!(constants[0].value().is_none());
    assert_eq!(
        constants[0].builtin().and_then(|builtin| builtin.name()).as_deref(),
        Some("FREE_STORAGE_POINTER()")
    );
    assert_eq!(constants[1].value().as_deref(), Some("0xffff_ffff"));

    assert_eq!(jumptables[0].labels(), ["transfer_dest", "balance_dest"]);
    assert!(!jumptables[0].is_packed());

    assert_eq!(tables[0].name().as_deref(), Some("CODE_TABLE"));
    assert_eq!(tables[0].body().unwrap().items().count(), 1);

    assert_eq!(tests[0].name().as_deref(), Some("TEST_ADD"));
    assert!(tests[0].parameters().is_empty());
}

#[test]
fn test_decorator_items() {
    let file = token_file();
    let decorator = file
        .definitions()
        .find_map(|definition| match definition {
            Definition::Decorator(decorator) => Some(decorator),
            _ => None,
        })
        .unwrap();
    let items: Vec<_> = decorator
        .items()
        .map(|item| (item.name().unwrap(), item.args()))
        .collect();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].0, "calldata");
    assert_eq!(items[0].1, ["0x01"]);
    assert_eq!(items[1].0, "value");
    assert_eq!(items[1].1, ["1"]);
}

#[test]
fn test_accessors_tolerate_incomplete_definitions() {
    let parse = parse_typed("#define macro BROKEN( = takes(0) { add");
    assert!(!parse.ok());
    let file = parse.source_file().unwrap();
    for item in file.macros() {
        let _ = item.name();
        let _ = item.parameters();
        let _ = item.takes();
        if let Some(body) = item.body() {
            assert!(body.items().count() <= 1);
        }
    }
}
