use gcodes::{
    ast::{ArgumentKind, Instruction},
    lexer::Lexer,
    parser::Parser,
};

fn parse_program() -> Vec<Instruction> {
    let source = include_str!("circle.gcode");

    Parser::from_source(source)
        .expect("could not tokenize circle.gcode")
        .parse()
        .expect("could not parse circle.gcode")
}

#[test]
fn test_circle_instruction_list() {
    let instructions = parse_program();

    assert_eq!(instructions.len(), 8);

    let summary: Vec<_> = instructions
        .iter()
        .map(|instruction| match instruction {
            Instruction::Gcode(code) => ("G", code.number),
            Instruction::Mcode(code) => ("M", code.number),
            Instruction::Tcode(code) => ("T", code.number),
            Instruction::Ocode(code) => ("O", code.program_number),
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            ("O", 4711),
            ("G", 17),
            ("G", 0),
            ("G", 1),
            ("G", 2),
            ("G", 0),
            ("M", 5),
            ("M", 30),
        ],
    );
}

#[test]
fn test_circle_line_numbers() {
    let instructions = parse_program();

    let lines: Vec<_> = instructions
        .iter()
        .map(|instruction| instruction.line())
        .collect();

    assert_eq!(
        lines,
        vec![
            None,
            Some(10),
            Some(20),
            Some(30),
            Some(40),
            Some(50),
            Some(60),
            Some(70),
        ],
    );
}

#[test]
fn test_circle_arc_arguments() {
    let instructions = parse_program();

    let arc = match &instructions[4] {
        Instruction::Gcode(code) => code,
        other => panic!("expected a gcode, got {:?}", other),
    };

    assert_eq!(arc.number, 2);
    assert_eq!(arc.arguments.len(), 5);
    assert_eq!(arc.value_for(ArgumentKind::X), Some(0.0));
    assert_eq!(arc.value_for(ArgumentKind::Y), Some(0.0));
    assert_eq!(arc.value_for(ArgumentKind::I), Some(25.0));
    assert_eq!(arc.value_for(ArgumentKind::J), Some(0.0));
    assert_eq!(arc.value_for(ArgumentKind::FeedRate), Some(1200.0));
}

#[test]
fn test_circle_comments() {
    let source = include_str!("circle.gcode");

    let mut lexer = Lexer::new(source);
    lexer.by_ref().for_each(|token| {
        token.expect("could not tokenize circle.gcode");
    });

    let texts: Vec<_> = lexer
        .comments()
        .iter()
        .map(|comment| comment.text)
        .collect();

    assert_eq!(
        texts,
        vec![
            " circle pocket",
            "rapid to the start point",
            "full circle",
        ],
    );
}
