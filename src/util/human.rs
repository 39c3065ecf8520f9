/// Format a raw byte count into a human-readable string: "3.6 TB"
pub fn fmt_bytes(bytes: u64) -> String {
    let b = bytes as f64;
    const TB: f64 = 1_099_511_627_776.0;
    const GB: f64 = 1_073_741_824.0;
    const MB: f64 = 1_048_576.0;
    const KB: f64 = 1_024.0;
    if b >= TB      { format!("{:.1} TB", b / TB) }
    else if b >= GB { format!("{:.1} GB", b / GB) }
    else if b >= MB { format!("{:.1} MB", b / MB) }
    else if b >= KB { format!("{:.1} KB", b / KB) }
    else            { format!("{:.0} B",  b) }
}
