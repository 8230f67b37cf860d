/*!
 * # Selection & Editing
 *
 * Everything that moves a caret or changes text on behalf of the user.
 *
 * ## Architecture Overview
 *
 * ### 1. Ranges, Not a Single Cursor
 * - A **`Selection`** holds any number of **`SelectionRange`**s plus the one
 *   designated *current* range that pointer drags and Shift+arrows extend
 * - A range stores `anchor` (where the gesture started) and `focus` (where it
 *   is now), each a `Position { block, offset }` into one element's content
 * - **`PhysicsRange`** is the document-order form of a range; every algorithm
 *   that cares about "start" and "end" works on it, so gesture direction
 *   never changes the result
 * - Ranges may not overlap: after any endpoint change, ranges whose highlight
 *   overlaps the current one by more than a small threshold are removed
 *
 * ### 2. Collapse is the Only Delete
 * - Removing selected text is `collapse`: slice within one element, or merge
 *   the focus element's remainder into the anchor element and drop everything
 *   between them in one store transaction
 * - Elements that followed the focus on its line are re-parented onto the
 *   nearest surviving ancestor, so no parent handle ever dangles
 * - Backspace and Delete pick a one-character span and collapse it
 *
 * ### 3. Structural vs Geometric Navigation
 * - `prev`/`next`/`line-start`/`line-end`/`first`/`end` are pure store walks
 * - `prev-line`/`next-line` measure the caret through the host and resolve a
 *   point half a row above or below it; these are the only moves that depend
 *   on rendering
 *
 * ### 4. Commands and History
 * - **`Cmd`** values are applied to every range; each produces an `Edit`
 *   carrying the store diff, the new caret and a position map used to carry
 *   the other ranges across the change
 * - **`History`** keeps before/after snapshots of elements and ranges per
 *   command; undo/redo replays them through the store and selection APIs
 *
 * ## Module Structure
 *
 * - **`range`**: `RangeId`, `Position`, `SelectionRange`, `PhysicsRange`
 * - **`selection`**: the range set, current range and overlap policy
 * - **`navigation`**: `Direction`, `get_end_by` and caret scroll detection
 * - **`collapse`**: range deletion with re-parenting
 * - **`commands`**: `Cmd`, `Edit`, text insertion and line breaking
 * - **`history`**: bounded undo/redo
 */

pub mod collapse;
pub mod commands;
pub mod history;
pub mod navigation;
pub mod range;
pub mod selection;

pub use collapse::collapse;
pub use commands::{Cmd, Edit};
pub use history::{History, Snapshot};
pub use navigation::{Direction, get_end_by, scroll_into_view};
pub use range::{PhysicsRange, Position, RangeId, SelectionRange};
pub use selection::{Selection, rects_intersect};
