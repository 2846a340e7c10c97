// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Logging setup

use tracing::Level;

/// Install a global fmt subscriber at the given level.
///
/// Library code never calls this. Repeated calls are no-ops, so tests may call it freely.
pub fn setup_logging(level: Level) {
    let installed = tracing_subscriber::fmt().with_max_level(level).with_target(false).try_init().is_ok();
    if installed {
        tracing::info!("Logging initialized at {}", level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_is_idempotent() {
        setup_logging(Level::DEBUG);
        setup_logging(Level::INFO);
        tracing::debug!("still logging after a second setup call");
    }
}
