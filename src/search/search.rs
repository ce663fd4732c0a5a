use crate::board::{Board, Piece};
use crate::moves::execute::{
    is_legal_move, make_move_basic, make_null_move, undo_move_basic, undo_null_move,
};
use crate::moves::magic::MagicTables;
use crate::moves::square_control::in_check;
use crate::moves::types::Move;
use crate::search::context::SearchContext;
use crate::search::eval::static_eval;
use crate::search::picker::MovePicker;
use crate::search::see::SeeExt;
use crate::search::tt::{NodeType, TranspositionTable};
use std::time::{Duration, Instant};

const INF: i32 = 32000;
const MATE_SCORE: i32 = 31000;
const MATE_THRESHOLD: i32 = MATE_SCORE - 1000; // 30000 - buffer for mate distance
const MAX_Q_SEARCH_DEPTH: usize = 100;
/// Drawn positions (repetition, fifty-move, insufficient material) score
/// as a flat draw rather than the contempt-biased value some engines use.
const DRAW_SCORE: i32 = 0;

// --- Tuning Constants ---

// Reverse Futility Pruning (RFP)
const RFP_DEPTH_LIMIT: i32 = 9;
const RFP_MARGIN_BASE: i32 = 80;
const RFP_MARGIN_MULT: i32 = 90;

// Futility Pruning (FP)
const FP_DEPTH_LIMIT: i32 = 7;
const FP_MARGIN_BASE: i32 = 100;
const FP_MARGIN_MULT: i32 = 100;
const FP_HISTORY_THRESHOLD: i32 = 512;

// Late Move Pruning (LMP)
const LMP_DEPTH_LIMIT: i32 = 14;
const LMP_BASE_MOVES: i32 = 3;
const LMP_MOVE_MULTIPLIER: i32 = 6;

// Late Move Reduction (LMR)
const LMR_MIN_DEPTH: i32 = 2;
const LMR_MIN_MOVES: i32 = 4;
// const LMR_BASE: f64 = 0.75;
// const LMR_DIVISOR: f64 = 2.5;

// --- TT Score Adjustment Helpers ---
fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}
// -----------------------------------

/// The clock state handed to a search: time remaining and increment for
/// the side to move, moves left to the next time control (if any), and
/// an optional hard per-move limit or an `infinite` request. Mirrors the
/// fields a GUI reports over a `go` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeControl {
    pub remaining: Option<Duration>,
    pub increment: Duration,
    pub moves_to_go: Option<u64>,
    /// An exact per-move budget (e.g. `movetime`); overrides the tiered
    /// allocation below when present.
    pub move_time: Option<Duration>,
    /// Search until told to stop; no time budget is computed.
    pub infinite: bool,
}

impl TimeControl {
    pub fn fixed(move_time: Duration) -> Self {
        Self {
            move_time: Some(move_time),
            ..Default::default()
        }
    }

    pub fn infinite() -> Self {
        Self {
            infinite: true,
            ..Default::default()
        }
    }

    /// Tiered time allocation: reserve a safety buffer against lag, then
    /// split the usable remainder more conservatively as the clock runs
    /// low, and never risk more than a fifth of it on one move.
    pub fn allocate(&self) -> Option<Duration> {
        if self.infinite {
            return None;
        }
        if let Some(mt) = self.move_time {
            return Some(mt);
        }
        let remaining = self.remaining?;
        let t = remaining.as_millis() as u64;
        let inc = self.increment.as_millis() as u64;

        let safety_buffer = (t * 15 / 100).min(500);
        let usable_time = t.saturating_sub(safety_buffer);

        let mut alloc: u64 = if let Some(mtg) = self.moves_to_go {
            let moves_to_plan = mtg.max(2);
            usable_time / moves_to_plan + (inc * 3) / 4
        } else if usable_time > 5000 {
            usable_time / 40 + (inc * 9) / 10
        } else if usable_time > 2000 {
            usable_time / 30 + (inc * 3) / 4
        } else if usable_time > 500 {
            usable_time / 20 + inc / 2
        } else {
            inc / 2 + 20
        };

        let hard_cap = usable_time / 5;
        alloc = alloc.min(hard_cap).min(usable_time);

        Some(Duration::from_millis(alloc))
    }
}

pub struct TimeManager {
    pub start_time: Instant,
    pub allotted: Option<Duration>,
    pub stop_signal: bool,
}

impl TimeManager {
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            start_time: Instant::now(),
            allotted: limit,
            stop_signal: false,
        }
    }

    /// Derive a `TimeManager` from a clock-level `TimeControl`.
    pub fn from_control(control: &TimeControl) -> Self {
        Self::new(control.allocate())
    }

    #[inline(always)]
    pub fn check_time(&mut self) {
        if self.stop_signal {
            return;
        }

        if let Some(limit) = self.allotted {
            let elapsed = self.start_time.elapsed();

            // Hard Stop: Abort immediately if we hit the limit
            if elapsed >= limit {
                self.stop_signal = true;
            }
        }
    }

    /// Returns the allocated time limit
    #[inline(always)]
    pub fn allocated_time(&self) -> Option<Duration> {
        self.allotted
    }

    /// Returns elapsed time since search started
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Quiescence delta-pruning margin: 1000cp, plus an extra 900cp allowance
/// when the side to move still has a pawn on its pre-promotion rank (its
/// capture could be masking an imminent queening).
fn big_delta(board: &Board) -> i32 {
    const BASE_DELTA: i32 = 1000;
    const PRE_PROMOTION_BONUS: i32 = 900;
    let pre_promotion_rank: u64 = match board.side_to_move {
        crate::board::Color::White => 6,
        crate::board::Color::Black => 1,
    };
    let rank_mask = 0xFFu64 << (pre_promotion_rank * 8);
    if board.pieces(Piece::Pawn, board.side_to_move) & rank_mask != 0 {
        BASE_DELTA + PRE_PROMOTION_BONUS
    } else {
        BASE_DELTA
    }
}

#[allow(clippy::too_many_arguments, clippy::only_used_in_recursion)]
pub fn quiescence(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> i32 {
    // SAFETY BRAKE: Prevent Q-search explosions
    if ply > MAX_Q_SEARCH_DEPTH {
        return static_eval(board, tables, alpha, beta);
    }

    let stand_pat = static_eval(board, tables, alpha, beta);

    if stand_pat >= beta {
        return beta;
    }
    if stand_pat >= alpha {
        alpha = stand_pat;
    }

    // Delta pruning: if even the best conceivable capture couldn't drag
    // this node back up to alpha, this whole node is hopeless.
    if stand_pat + big_delta(board) < alpha {
        return alpha;
    }

    // Use MovePicker in captures-only mode for quiescence
    let empty_killers = [None, None];
    let empty_history = [[0i32; 64]; 64];
    let mut picker = MovePicker::new(None, empty_killers, true);

    while let Some(mv) = picker.next(board, tables, &empty_history) {
        *nodes += 1;
        if *nodes & 63 == 0 {
            time.check_time();
        }
        if time.stop_signal {
            return stand_pat;
        }

        let is_prom = mv.is_promotion();
        let is_ep = mv.is_en_passant();

        // SEE Pruning: Skip captures that lose material
        // Note: MovePicker already filters bad captures for us, but we keep this
        // for promotions and en passant which bypass SEE classification
        if !is_prom && !is_ep && !board.static_exchange_eval(mv, 0, tables) {
            continue;
        }

        let undo = make_move_basic(board, mv);
        let score = -quiescence(board, tables, ctx, tt, ply + 1, -beta, -alpha, nodes, time);
        undo_move_basic(board, undo);

        if score >= beta {
            return beta;
        }
        if score > alpha {
            alpha = score;
        }
    }
    alpha
}

#[allow(clippy::too_many_arguments, clippy::only_used_in_recursion)]
pub fn alpha_beta(
    board: &mut Board,
    tables: &MagicTables,
    ctx: &mut SearchContext,
    tt: &mut TranspositionTable,
    depth: i32,
    ply: usize,
    mut alpha: i32,
    beta: i32,
    nodes: &mut u64,
    time: &mut TimeManager,
) -> (i32, Option<Move>) {
    // Check every 1024 nodes instead of 2047 for tighter control
    if *nodes & 63 == 0 {
        time.check_time();
    }

    if time.stop_signal {
        return (0, None);
    }
    *nodes += 1;

    // 2. Draw short-circuit (repetition / fifty-move / insufficient material)
    if ply > 0
        && (board.is_repetition()
            || crate::status::is_draw_by_fifty_move(board)
            || crate::status::is_insufficient_material(board))
    {
        return (DRAW_SCORE, None);
    }

    if time.stop_signal {
        return (0, None);
    }

    let hash = board.zobrist;
    let mut hash_move = None;

    // TT PROBE WITH MATE SCORE ADJUSTMENT
    if let Some((tt_move, raw_score, tt_depth, tt_bound)) =
        tt.probe(hash, depth as u8, alpha, beta, ply as i32)
    {
        if let Some(tm) = tt_move {
            hash_move = Some(tm);
        }

        if tt_depth >= depth as u8 {
            // Convert the stored independent score back to relative score
            let tt_score = score_from_tt(raw_score, ply as i32);

            if ply > 0 {
                match tt_bound {
                    0 => return (tt_score, tt_move),
                    1 if tt_score >= beta => return (tt_score, tt_move),
                    2 if tt_score <= alpha => return (tt_score, tt_move),
                    _ => {}
                }
            }
        }
    }

    let in_check_now = in_check(board, board.side_to_move, tables);

    // FIX 6: CHECK EXTENSION
    // If we are in check, extend the search by 1 ply.
    // This resolves forced mates and prevents the horizon effect.
    let extension = if in_check_now { 1 } else { 0 };

    if depth <= 0 && !in_check_now {
        let score = quiescence(board, tables, ctx, tt, ply, alpha, beta, nodes, time);
        return (score, None);
    }

    // [STEP 1] Calculate Eval Early
    // We lift this out so both RFP and SFP can share it.
    let static_eval_val = if !in_check_now {
        static_eval(board, tables, alpha, beta)
    } else {
        0 // Dummy value, we won't use it if in check
    };

    // [STEP 2] Update Reverse Futility Pruning (RFP) to use the variable
    if depth < RFP_DEPTH_LIMIT && !in_check_now && ply > 0 {
        let margin = RFP_MARGIN_BASE + RFP_MARGIN_MULT * depth;
        if static_eval_val - margin >= beta {
            return (beta, None);
        }
    }
    // =============================================================

    // =============================================================
    // 1. NULL MOVE PRUNING (Tuned)
    // =============================================================
    if depth >= 4
        && !in_check_now
        // REMOVED: && (beta - alpha == 1) <--- Unlocks NMP for PV nodes (Massive speedup)
        && board.has_major_pieces(board.side_to_move)
        && static_eval_val >= beta
    // Only null move if we are already winning statically
    {
        // Dynamic Reduction: If deep, reduce more.
        let r = if depth > 6 { 3 } else { 2 };

        let undo = make_null_move(board);

        // Scout search with Null Window
        let (val, _) = alpha_beta(
            board,
            tables,
            ctx,
            tt,
            depth - r - 1,
            ply + 1,
            -beta,
            -beta + 1,
            nodes,
            time,
        );
        let score = -val;
        undo_null_move(board, undo);

        if score >= beta && !time.stop_signal {
            // Verification search for high depths (Optional safety)
            if score >= MATE_THRESHOLD {
                // Don't trust null move mates, search normally
            } else {
                return (beta, None);
            }
        }
    }

    // Use MovePicker for staged move generation
    let mut picker = MovePicker::new(hash_move, ctx.killer_moves[ply], false);

    let mut best_move = None;
    let mut best_score = -INF;
    let original_alpha = alpha;
    let mut move_count = 0;

    while let Some(mv) = picker.next(board, tables, &ctx.history) {
        // [STEP 3] OPTIMIZED FUTILITY PRUNING
        // Logic: If the move is quiet and our position is hopelessly below Alpha, skip it.
        if depth < FP_DEPTH_LIMIT
            && !in_check_now
            && !mv.is_capture()
            && !mv.is_promotion()
            && move_count > 0
        {
            let margin = FP_MARGIN_BASE + FP_MARGIN_MULT * depth;

            // HISTORY PROTECTION (The Optimization):
            // We retrieve the history score for this move.
            let history = ctx.history[mv.from.index() as usize][mv.to.index() as usize];

            // If the move has a high history score (> 2000), it has been good in other nodes.
            // We should NOT prune it, even if static eval says it's bad.
            if history < FP_HISTORY_THRESHOLD && static_eval_val + margin <= alpha {
                continue; // PRUNE: Skip to next move
            }
        }

        // =========================================================
        // LATE MOVE PRUNING (LMP)
        // =========================================================
        // Logic: If we have searched many quiet moves and haven't found a
        // good one yet, it's highly unlikely the remaining (unsorted) moves
        // will be any better. Just cut them off.
        if depth < LMP_DEPTH_LIMIT
            && !in_check_now
            && !mv.is_capture()
            && !mv.is_promotion()
            && alpha == original_alpha
        {
            let lmp_threshold = LMP_BASE_MOVES + LMP_MOVE_MULTIPLIER * depth;
            if move_count > lmp_threshold as usize {
                break;
            }
        }
        // =========================================================

        let undo = make_move_basic(board, mv);
        let mut score;

        if move_count == 0 {
            let (val, _) = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                depth - 1 + extension,
                ply + 1,
                -beta,
                -alpha,
                nodes,
                time,
            );
            score = -val;
        } else {
            // =========================================================
            // 2. LATE MOVE REDUCTION (Tuned: Soft Formula)
            // =========================================================
            let mut r = 0;
            if depth > LMR_MIN_DEPTH
                && move_count > LMR_MIN_MOVES as usize
                && !mv.is_capture()
                && !mv.is_promotion()
                && !in_check_now
            // Don't reduce if we are escaping check!
            {
                // OLD (Suicidal): 1 + (depth / 3) + (move_count / 10)

                // NEW (Standard):
                // 1. Base reduction
                r = 1 + (depth / 8) + (move_count as i32 / 20);

                // 2. History Safety (Keep this, it's good)
                let history = ctx.history[mv.from.index() as usize][mv.to.index() as usize];
                if history > FP_HISTORY_THRESHOLD {
                    r -= 1; // Trust history
                }

                // 3. PV Node Safety
                // If we are in a PV node (open window), reduce less
                if beta - alpha > 1 {
                    r -= 1;
                }

                // Clamp
                if r < 0 {
                    r = 0;
                }
                if r > depth - 2 {
                    r = depth - 2;
                } // Leave at least depth 1
            }

            // Perform the Reduced Search (Zero Window)
            let (val, _) = alpha_beta(
                board,
                tables,
                ctx,
                tt,
                depth - 1 - r,
                ply + 1,
                -alpha - 1,
                -alpha,
                nodes,
                time,
            );
            score = -val;

            // Re-search if the reduced search found a surprisingly good move
            if score > alpha && r > 0 {
                let (val, _) = alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    depth - 1,
                    ply + 1,
                    -alpha - 1,
                    -alpha,
                    nodes,
                    time,
                );
                score = -val;
            }

            if score > alpha && score < beta {
                let (val, _) = alpha_beta(
                    board,
                    tables,
                    ctx,
                    tt,
                    depth - 1 + extension,
                    ply + 1,
                    -beta,
                    -alpha,
                    nodes,
                    time,
                );
                score = -val;
            }
        }

        undo_move_basic(board, undo);
        move_count += 1;

        if time.stop_signal {
            return (0, None);
        }

        if score > best_score {
            best_score = score;
            if score > alpha {
                alpha = score;
                best_move = Some(mv);
            }
            if score >= beta {
                // TT SAVE WITH MATE SCORE ADJUSTMENT (LowerBound/Beta Cutoff)
                let tt_score = score_to_tt(beta, ply as i32);
                tt.save(
                    hash,
                    Some(mv),
                    tt_score,
                    depth as u8,
                    NodeType::LowerBound as u8,
                    ply as i32,
                );

                if !mv.is_capture() {
                    ctx.update_killer(ply, mv);

                    let bonus = depth * depth;
                    ctx.update_history(mv, bonus);
                }

                return (beta, Some(mv));
            }
        }
    }

    // No legal moves found - checkmate or stalemate
    if move_count == 0 {
        if in_check_now {
            return (-MATE_SCORE + ply as i32, None);
        }
        return (0, None);
    }

    if time.stop_signal {
        return (0, None);
    }

    let node_type = if best_score >= beta {
        NodeType::LowerBound
    } else if best_score > original_alpha {
        NodeType::Exact
    } else {
        NodeType::UpperBound
    };

    // TT SAVE WITH MATE SCORE ADJUSTMENT (Best Score)
    // We save 'best_score' (which is alpha if exact, or the best failed low score if UpperBound)
    let tt_score = score_to_tt(best_score, ply as i32);
    tt.save(
        hash,
        best_move,
        tt_score,
        depth as u8,
        node_type as u8,
        ply as i32,
    );

    (best_score, best_move)
}

pub fn search(
    board: &mut Board,
    tables: &MagicTables,
    max_depth: i32,
    time_limit: Option<Duration>,
) -> (i32, Option<Move>) {
    let mut last_completed_best_move = None;
    let mut last_completed_best_score = 0;
    let mut nodes = 0;
    let mut tt = TranspositionTable::new(512);
    let mut ctx = SearchContext::new();
    let mut time = TimeManager::new(time_limit);
    let mut last_iter_duration = Duration::from_millis(0);

    for depth in 1..=max_depth {
        let iter_start = Instant::now();

        // --- ITERATIVE DEEPENING SAFETY CHECK ---
        // Predict if we can afford the next depth before starting it.
        // Conservative estimate: Next depth takes ~3x longer than previous.
        // (Using 3x instead of 2x because branching factor can spike in tactical positions)
        if depth > 1
            && let Some(limit) = time.allocated_time()
        {
            let total_elapsed = time.elapsed();
            let predicted_next = last_iter_duration * 3;

            // If predicting the next depth would push us over the limit: STOP.
            if total_elapsed + predicted_next > limit {
                break;
            }
        }
        // -----------------------------------------

        for from in 0..64 {
            for to in 0..64 {
                ctx.history[from][to] /= 8;
            }
        }

        // --- Aspiration Window Logic ---
        // Windows are centred on the previous iteration's score with a
        // small initial width; on fail-low/fail-high the corresponding
        // bound widens exponentially (`delta += pow(delta + 0.6, delta)`)
        // rather than snapping straight to +-infinity, up to a bounded
        // number of attempts before falling back to the full window.
        const INITIAL_WINDOW: f64 = 25.0;
        const MAX_ASPIRATION_ATTEMPTS: u32 = 4;

        let mut alpha = -INF;
        let mut beta = INF;
        let mut delta = INITIAL_WINDOW;

        // Only apply aspiration windows at depth > 4 for stability
        if depth > 4 {
            alpha = (last_completed_best_score as f64 - delta) as i32;
            beta = (last_completed_best_score as f64 + delta) as i32;
        }

        let mut score;
        let mut mv;
        let mut attempts: u32 = 0;

        loop {
            // Perform the search with the current window
            let result = alpha_beta(
                board, tables, &mut ctx, &mut tt, depth, 0, alpha, beta, &mut nodes, &mut time,
            );

            score = result.0;
            mv = result.1;

            // If we ran out of time during the search, stop immediately
            if time.stop_signal {
                break;
            }

            // 1. Fail Low (Score <= Alpha): Position is worse than expected.
            // Only widen alpha downwards. Keep beta unchanged for stability.
            if score <= alpha {
                attempts += 1;
                if attempts > MAX_ASPIRATION_ATTEMPTS {
                    alpha = -INF;
                } else {
                    delta += (delta + 0.6).powf(delta);
                    alpha = (last_completed_best_score as f64 - delta) as i32;
                }
                continue;
            }

            // 2. Fail High (Score >= Beta): Position is better than expected.
            // Only widen beta upwards. Keep alpha unchanged for stability.
            if score >= beta {
                attempts += 1;
                if attempts > MAX_ASPIRATION_ATTEMPTS {
                    beta = INF;
                } else {
                    delta += (delta + 0.6).powf(delta);
                    beta = (last_completed_best_score as f64 + delta) as i32;
                }
                continue;
            }

            // 3. Success: Score is within the window.
            break;
        }
        // -------------------------------

        // Record duration for the NEXT prediction check
        last_iter_duration = iter_start.elapsed();

        // CRITICAL FIX: If the stop signal was triggered, DO NOT update the best move.
        // The search at this depth is incomplete and likely contains blunders.
        if time.stop_signal {
            break;
        }

        // Only update if the depth actually finished
        last_completed_best_score = score;
        last_completed_best_move = mv;

        // Output info for GUI (standard UCI)
        if let Some(valid_mv) = last_completed_best_move {
            let score_str = if last_completed_best_score.abs() >= MATE_THRESHOLD {
                let moves = (MATE_SCORE - last_completed_best_score.abs() + 1) / 2;
                if last_completed_best_score > 0 {
                    format!("mate {}", moves)
                } else {
                    format!("mate -{}", moves)
                }
            } else {
                format!("cp {}", last_completed_best_score)
            };

            tracing::info!(
                depth,
                score = %score_str,
                nodes,
                time_ms = time.start_time.elapsed().as_millis() as u64,
                pv = %valid_mv.to_uci(),
                "iterative deepening progress"
            );
        }

        // Optimization: If we found a mate, stop searching deeper
        if score.abs() >= MATE_THRESHOLD {
            break;
        }
    }

    (last_completed_best_score, last_completed_best_move)
}

/// One reported line: a principal variation plus the bound type the score
/// carries (only meaningful when multiple variations are compared — with
/// a single line it is always `Exact`).
#[derive(Debug, Clone)]
pub struct Variation {
    pub kind: NodeType,
    pub score: i32,
    pub moves: Vec<Move>,
}

/// The root search result object: mirrors what a UCI/CLI front-end needs
/// to report `info`/`bestmove` without reaching back into search
/// internals. `search_with_results` builds this around the same
/// iterative-deepening driver `search` uses; `searched_variations` holds
/// a single line since this driver does not (yet) support multi-PV.
pub struct SearchResults {
    pub best_move: Option<Move>,
    pub best_score: i32,
    pub searched_depth: i32,
    pub visited_nodes: u64,
    pub search_start: Instant,
    pub curr_depth_start: Instant,
    pub searched_variations: Vec<Variation>,
}

/// Walks the transposition table from the current `board` forward,
/// replaying each stored best move, to recover the principal variation
/// for reporting. Stops at the first missing/illegal TT entry, a
/// repeated position (to avoid an infinite loop through a draw line), or
/// `max_len` moves, whichever comes first.
fn extract_pv(board: &mut Board, tables: &MagicTables, tt: &TranspositionTable, max_len: usize) -> Vec<Move> {
    let mut pv = Vec::with_capacity(max_len);
    let mut seen_keys = Vec::with_capacity(max_len);
    let mut undos = Vec::with_capacity(max_len);

    for _ in 0..max_len {
        let hash = board.zobrist;
        if seen_keys.contains(&hash) {
            break;
        }

        let Some((Some(mv), _, _, _)) = tt.probe(hash, 0, -INF, INF, 0) else {
            break;
        };
        if !crate::search::picker::is_pseudo_legal(board, mv, tables) || !is_legal_move(board, mv, tables) {
            break;
        }

        seen_keys.push(hash);
        pv.push(mv);
        undos.push(make_move_basic(board, mv));
    }

    // Undo every move we made while walking, deepest first.
    while let Some(undo) = undos.pop() {
        undo_move_basic(board, undo);
    }

    pv
}

/// Same iterative-deepening driver as `search`, but returns the richer
/// `SearchResults` object described by the search-results external
/// interface contract instead of a bare `(score, move)` tuple.
pub fn search_with_results(
    board: &mut Board,
    tables: &MagicTables,
    max_depth: i32,
    time_limit: Option<Duration>,
) -> SearchResults {
    let search_start = Instant::now();
    let mut last_completed_best_move = None;
    let mut last_completed_best_score = 0;
    let mut searched_depth = 0;
    let mut nodes = 0;
    let mut tt = TranspositionTable::new(512);
    let mut ctx = SearchContext::new();
    let mut time = TimeManager::new(time_limit);
    let mut last_iter_duration = Duration::from_millis(0);
    let mut curr_depth_start = search_start;

    for depth in 1..=max_depth {
        curr_depth_start = Instant::now();

        if depth > 1
            && let Some(limit) = time.allocated_time()
        {
            let total_elapsed = time.elapsed();
            let predicted_next = last_iter_duration * 3;
            if total_elapsed + predicted_next > limit {
                break;
            }
        }

        for from in 0..64 {
            for to in 0..64 {
                ctx.history[from][to] /= 8;
            }
        }

        const INITIAL_WINDOW: f64 = 25.0;
        const MAX_ASPIRATION_ATTEMPTS: u32 = 4;

        let mut alpha = -INF;
        let mut beta = INF;
        let mut delta = INITIAL_WINDOW;

        if depth > 4 {
            alpha = (last_completed_best_score as f64 - delta) as i32;
            beta = (last_completed_best_score as f64 + delta) as i32;
        }

        let mut score;
        let mut mv;
        let mut attempts: u32 = 0;

        loop {
            let result = alpha_beta(
                board, tables, &mut ctx, &mut tt, depth, 0, alpha, beta, &mut nodes, &mut time,
            );
            score = result.0;
            mv = result.1;

            if time.stop_signal {
                break;
            }
            if score <= alpha {
                attempts += 1;
                if attempts > MAX_ASPIRATION_ATTEMPTS {
                    alpha = -INF;
                } else {
                    delta += (delta + 0.6).powf(delta);
                    alpha = (last_completed_best_score as f64 - delta) as i32;
                }
                continue;
            }
            if score >= beta {
                attempts += 1;
                if attempts > MAX_ASPIRATION_ATTEMPTS {
                    beta = INF;
                } else {
                    delta += (delta + 0.6).powf(delta);
                    beta = (last_completed_best_score as f64 + delta) as i32;
                }
                continue;
            }
            break;
        }

        last_iter_duration = curr_depth_start.elapsed();

        if time.stop_signal {
            break;
        }

        last_completed_best_score = score;
        last_completed_best_move = mv;
        searched_depth = depth;

        if score.abs() >= MATE_THRESHOLD {
            break;
        }
    }

    let searched_variations = match last_completed_best_move {
        Some(mv) => {
            let mut moves = vec![mv];
            let undo = make_move_basic(board, mv);
            moves.extend(extract_pv(board, tables, &tt, 63));
            undo_move_basic(board, undo);
            vec![Variation {
                kind: NodeType::Exact,
                score: last_completed_best_score,
                moves,
            }]
        }
        None => Vec::new(),
    };

    SearchResults {
        best_move: last_completed_best_move,
        best_score: last_completed_best_score,
        searched_depth,
        visited_nodes: nodes,
        search_start,
        curr_depth_start,
        searched_variations,
    }
}
