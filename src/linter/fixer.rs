use std::ops::Range;

/// 一次文本替换：用 `text` 替换源码中的字节区间 `range`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fix {
    pub range: Range<usize>,
    pub text: String,
}

impl Fix {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            range: at..at,
            text: text.into(),
        }
    }

    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            range: start..end,
            text: text.into(),
        }
    }
}

/// 按位置顺序应用修复，跳过与已应用修复重叠或相邻的修复
///
/// 返回修复后的文本和实际应用的数量；被跳过的修复留给下一轮。
pub fn apply_fixes(code: &str, fixes: &[Fix]) -> (String, usize) {
    let mut ordered: Vec<&Fix> = fixes
        .iter()
        .filter(|fix| {
            fix.range.start <= fix.range.end
                && fix.range.end <= code.len()
                && code.is_char_boundary(fix.range.start)
                && code.is_char_boundary(fix.range.end)
        })
        .collect();
    ordered.sort_by_key(|fix| (fix.range.start, fix.range.end));

    let mut output = String::with_capacity(code.len() + 16);
    let mut cursor = 0;
    let mut last_end: Option<usize> = None;
    let mut applied = 0;

    for fix in ordered {
        if let Some(end) = last_end {
            if fix.range.start <= end {
                continue;
            }
        }
        output.push_str(&code[cursor..fix.range.start]);
        output.push_str(&fix.text);
        cursor = fix.range.end;
        last_end = Some(fix.range.end);
        applied += 1;
    }

    output.push_str(&code[cursor..]);
    (output, applied)
}
