use chinchon_advisor::Card;
use chinchon_advisor::engine::Advice;
use chinchon_advisor::session::{Command, DiscardMode, Seat, Session};

fn card(code: &str) -> Card {
    code.parse().expect("demo card codes are valid")
}

fn print_hand(session: &Session) {
    let hand = session.snapshot().hand;
    let line: Vec<String> = hand
        .iter()
        .map(|h| {
            if h.grouped {
                format!("[{}]", h.card)
            } else {
                h.card.to_string()
            }
        })
        .collect();
    println!("  hand: {}", line.join(" "));
}

fn main() {
    println!("Chinchón advisor\n");

    let mut session = Session::default();
    session
        .apply(Command::SetPlayers { players: 2 })
        .expect("two players");
    session
        .apply(Command::SetStartSeat { seat: Seat::North })
        .expect("north is active");

    for (slot, code) in ["C-4", "O-10", "C-5", "E-10", "E-2", "B-10", "B-12"]
        .iter()
        .enumerate()
    {
        session
            .apply(Command::SetHandSlot {
                slot,
                card: card(code),
            })
            .expect("distinct cards");
    }
    session
        .apply(Command::SetTableCard { card: card("O-7") })
        .expect("table card");
    session.apply(Command::StartRound).expect("round starts");
    println!("Round started, North opens.");
    print_hand(&session);

    // North draws blind and throws the 6 of copas
    session
        .apply(Command::RivalDrawHidden { seat: Seat::North })
        .expect("north draws");
    session
        .apply(Command::RivalDiscard {
            seat: Seat::North,
            card: card("C-6"),
        })
        .expect("north discards");
    println!("\nNorth drew hidden and discarded the {}.", card("C-6").name());

    let Some(recommendation) = session.recommendation().cloned() else {
        println!("No recommendation available.");
        return;
    };
    println!("\nAdvice: {}", recommendation.headline);
    for line in &recommendation.explanation {
        println!("  - {}", line);
    }
    for note in &recommendation.notes {
        println!("  * {}", note);
    }

    match recommendation.advice {
        Advice::TakeAndClose { discard, .. } => {
            session
                .apply(Command::TakeFromTable {
                    discard: DiscardMode::Manual,
                })
                .expect("take from table");
            session
                .apply(Command::Close {
                    discard: Some(discard),
                })
                .expect("close");
        }
        Advice::CloseNow { .. } => {
            session
                .apply(Command::Close { discard: None })
                .expect("close");
        }
        Advice::TakeFromTable { .. } => {
            session
                .apply(Command::TakeFromTable {
                    discard: DiscardMode::Auto,
                })
                .expect("take from table");
        }
        Advice::DrawHidden { .. } => {
            println!("\nDrawing hidden; pretend it was the 3 de bastos.");
            session
                .apply(Command::DrawHidden {
                    discard: DiscardMode::Auto,
                })
                .expect("draw hidden");
            session
                .apply(Command::ProvideDrawnCard { card: card("B-3") })
                .expect("unseen card");
        }
    }

    let snapshot = session.snapshot();
    println!();
    match snapshot.closure {
        Some(closure) => {
            let leftovers: Vec<String> = closure.leftovers.iter().map(Card::name).collect();
            println!(
                "Round closed with {} cards grouped, leftover: {}",
                closure.grouped,
                if leftovers.is_empty() {
                    "none".to_string()
                } else {
                    leftovers.join(", ")
                }
            );
        }
        None => {
            println!("Turn passes to {:?}.", snapshot.turn);
            print_hand(&session);
        }
    }
}
