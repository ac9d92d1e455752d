/*
 * delegate.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tether, a client-side web connection library.
 *
 * Tether is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tether is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tether.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Connection status callbacks.

/// Lifecycle status of a connection, reported to the delegate on every
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Resolving the host name.
    Resolving,
    /// Connecting to the server.
    Connecting,
    /// Connected to the server.
    Connected,
    /// Transferring data to or from the server.
    Transferring,
    /// The transfer finished.
    Finished,
    /// Connection closed. It may be reopened.
    Closed,
    /// Operation cancelled by the caller.
    Cancelled,
    /// An error occurred during the last step.
    Error,
}

/// Observer for connection status transitions. Invoked synchronously from the
/// connection on the calling task; implementations should return quickly.
pub trait ConnectionDelegate: Send + Sync {
    fn update_status(&self, status: ConnectionStatus);
}
