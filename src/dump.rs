//! Dump the raw `getevent` stream for debugging.
//! Run: tap-rec dump  to print every line with its decoded triple.

use std::io::{BufRead, BufReader};
use std::thread;

use tap_rec::input::{split_device, tokenize, EventKind};
use tap_rec::shell::{drain_stderr, RemoteShell, SpawnedCommand};

fn code_name(kind: EventKind, code: u16) -> String {
    match kind {
        EventKind::Sync if code == 0 => "SYN_REPORT".into(),
        EventKind::Sync => format!("SYN/{}", code),
        EventKind::Key => format!("KEY/{:#x}", code),
        EventKind::Abs => {
            let abs = match code {
                0x00 => "X",
                0x01 => "Y",
                0x2f => "MT_SLOT",
                0x30 => "MT_TOUCH_MAJOR",
                0x31 => "MT_TOUCH_MINOR",
                0x35 => "MT_POSITION_X",
                0x36 => "MT_POSITION_Y",
                0x39 => "MT_TRACKING_ID",
                0x3a => "MT_PRESSURE",
                _ => "?",
            };
            format!("ABS_{}({:#x})", abs, code)
        }
    }
}

pub fn run(shell: &dyn RemoteShell, command: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let SpawnedCommand {
        stdout,
        stderr,
        terminator,
    } = shell.spawn(command)?;
    thread::spawn(move || drain_stderr(stderr));
    eprintln!("Dumping `{}` (Ctrl+C to stop):\n", command);

    let mut reader = BufReader::new(stdout);
    let mut line = Vec::new();
    let mut n = 0u64;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        let (device, body) = split_device(&text);
        if body.is_empty() {
            continue;
        }
        n += 1;
        match tokenize(body) {
            Some(ev) => println!(
                "{:6}  {}  {}  value={}",
                n,
                device.unwrap_or("-"),
                code_name(ev.kind, ev.code),
                ev.value
            ),
            None => println!("{:6}  {}", n, text.trim_end()),
        }
    }

    terminator.terminate();
    Ok(())
}
