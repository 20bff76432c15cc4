use ksdist_core::{KeystreamGenerator, Rc4, Result};

pub fn run() -> Result<()> {
    Rc4::self_test()?;
    println!("{}: self-test passed (RFC 6229, 128-bit key)", Rc4::NAME);
    Ok(())
}
