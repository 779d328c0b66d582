mod formatter;

pub use formatter::{
    format_certificate, format_liability_table, format_party_factors, format_verdict,
    should_use_colors, wrap_for_terminal, write_certificate,
};
