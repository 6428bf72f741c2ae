//! Source fixtures

pub const ASSIGNMENTS: &str = "x = 1;\ny = x + 2;\nz = (x + y) + \"s\";\n";

pub const NESTED_BLOCKS: &str = r#"
a = 1;
{
    b = a + 1; // inner
    {
        c = b;
    }
}
/* done */
d = "end";
"#;

pub const MISSING_OPERAND: &str = "x = 1 + ;";

/// `count` statements of the form `vN = vN + N;`, one per line
pub fn statements(count: usize) -> String {
    let mut source = String::new();
    for i in 0..count {
        source.push_str(&format!("v{i} = v{i} + {i};\n"));
    }
    source
}

/// Byte offset of the start of `line` (0-based) in `source`
pub fn line_start(source: &str, line: usize) -> u32 {
    source
        .split_inclusive('\n')
        .take(line)
        .map(str::len)
        .sum::<usize>() as u32
}
