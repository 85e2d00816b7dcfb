#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagColors {
    pub background: &'static str,
    pub foreground: &'static str,
}

pub const TAG_PALETTE: [TagColors; 8] = [
    TagColors { background: "#fecaca", foreground: "#991b1b" },
    TagColors { background: "#bfdbfe", foreground: "#1e40af" },
    TagColors { background: "#bbf7d0", foreground: "#166534" },
    TagColors { background: "#ddd6fe", foreground: "#6b21a8" },
    TagColors { background: "#fbcfe8", foreground: "#9d174d" },
    TagColors { background: "#c7d2fe", foreground: "#3730a3" },
    TagColors { background: "#99f6e4", foreground: "#115e59" },
    TagColors { background: "#fde68a", foreground: "#92400e" },
];

/// Sum of the UTF-16 code units of `tag`, modulo the palette size.
pub fn palette_index(tag: &str) -> usize {
    // 2^32 is a multiple of the palette size, so wrapping keeps the residue.
    let sum = tag
        .encode_utf16()
        .fold(0u32, |acc, unit| acc.wrapping_add(u32::from(unit)));
    sum as usize % TAG_PALETTE.len()
}

pub fn color_of(tag: &str) -> TagColors {
    TAG_PALETTE[palette_index(tag)]
}
