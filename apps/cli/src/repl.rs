//! Terminal decision loop: prompts for a decision, forwards it to the
//! session and prints new messages and the status view.

use crate::view::render_status;
use anyhow::Result;
use baker_econ::CustomerSource;
use baker_runtime::{Decision, PurchaseOrder, Session, SessionError};
use persistence::SnapshotStore;
use std::io::{BufRead, Write};

const MENU: &str = "What would you like to get?
  1) Supplies
  2) Employees
  3) Bakeries
  4) Loan
  5) Nothing
  q) Quit";

const WIP: &str = "This feature is a work in progress.";

/// Read one trimmed line; `None` on end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    text: &str,
) -> Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;
    read_line(input)
}

/// Print messages appended since `cursor` and advance it.
pub fn flush_messages<C, S, W>(
    session: &Session<C, S>,
    out: &mut W,
    cursor: &mut usize,
) -> Result<()>
where
    C: CustomerSource,
    S: SnapshotStore,
    W: Write,
{
    for msg in session.log().since(*cursor) {
        writeln!(out, "{msg}")?;
    }
    *cursor = session.log().len();
    Ok(())
}

/// User-facing rejections are already in the log; anything else is fatal.
fn settle(result: Result<(), SessionError>) -> Result<()> {
    match result {
        Ok(())
        | Err(SessionError::InsufficientFunds { .. })
        | Err(SessionError::InvalidLoanRequest(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Ask for a quantity of each supply. `None` means the player cancelled.
fn supplies_form<C, S, R, W>(
    session: &Session<C, S>,
    input: &mut R,
    out: &mut W,
) -> Result<Option<PurchaseOrder>>
where
    C: CustomerSource,
    S: SnapshotStore,
    R: BufRead,
    W: Write,
{
    writeln!(out, "What would you like to get?")?;
    let mut order = PurchaseOrder::new();
    for item in &session.state().supplies {
        let label = format!("  {} ({}/{}): ", item.name, item.cost, item.unit);
        let Some(raw) = prompt(input, out, &label)? else {
            return Ok(None);
        };
        order.set(item.name.clone(), baker_runtime::parse_quantity(&raw));
    }
    match prompt(input, out, "[p]urchase or [c]ancel? ")? {
        Some(answer)
            if answer.eq_ignore_ascii_case("p") || answer.eq_ignore_ascii_case("purchase") =>
        {
            Ok(Some(order))
        }
        _ => Ok(None),
    }
}

/// Ask for a loan amount. `None` means the player cancelled.
fn loan_form<C, S, R, W>(
    session: &Session<C, S>,
    input: &mut R,
    out: &mut W,
) -> Result<Option<String>>
where
    C: CustomerSource,
    S: SnapshotStore,
    R: BufRead,
    W: Write,
{
    writeln!(out, "You can borrow up to {:.2}.", session.max_loan())?;
    writeln!(
        out,
        "The loan will have a 10% interest rate, with a weekly payment of 2% of the outstanding debt."
    )?;
    match prompt(input, out, "Loan amount (blank to cancel): ")? {
        Some(raw) if !raw.is_empty() => Ok(Some(raw)),
        _ => Ok(None),
    }
}

/// Run the decision loop until the player quits or input ends.
pub fn run<C, S, R, W>(session: &mut Session<C, S>, input: &mut R, out: &mut W) -> Result<()>
where
    C: CustomerSource,
    S: SnapshotStore,
    R: BufRead,
    W: Write,
{
    let mut cursor = 0;
    flush_messages(session, out, &mut cursor)?;
    write!(out, "{}", render_status(session.state()))?;
    loop {
        writeln!(out, "{MENU}")?;
        let Some(choice) = prompt(input, out, "> ")? else {
            break;
        };
        let acted = match choice.to_ascii_lowercase().as_str() {
            "1" | "supplies" => match supplies_form(session, input, out)? {
                Some(order) => {
                    settle(session.decide(Decision::Purchase(order)).map(|_| ()))?;
                    true
                }
                None => false,
            },
            "2" | "employees" | "3" | "bakeries" => {
                session.notify(WIP);
                false
            }
            "4" | "loan" => match loan_form(session, input, out)? {
                Some(raw) => {
                    let amount = baker_runtime::parse_amount(&raw);
                    settle(session.decide(Decision::Loan(amount)).map(|_| ()))?;
                    true
                }
                None => false,
            },
            "5" | "nothing" => {
                settle(session.decide(Decision::Nothing).map(|_| ()))?;
                true
            }
            "q" | "quit" => break,
            _ => false,
        };
        flush_messages(session, out, &mut cursor)?;
        if acted {
            write!(out, "{}", render_status(session.state()))?;
        }
    }
    Ok(())
}
