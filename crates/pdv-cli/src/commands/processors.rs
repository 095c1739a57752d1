use std::io::{self, Write};

use anyhow::Result;
use tabwriter::TabWriter;

use pdv_metrics::ProcessorKind;

pub fn handle() -> Result<()> {
    let mut writer = TabWriter::new(io::stdout()).padding(2);
    writeln!(writer, "PROCESSOR\tMETRICS")?;
    for name in ProcessorKind::available() {
        let kind: ProcessorKind = name.parse()?;
        let processor = kind.build()?;
        writeln!(writer, "{}\t{}", processor.name(), processor.registry().len())?;
    }
    writer.flush()?;
    Ok(())
}
