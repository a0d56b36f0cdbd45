/* ************************************************************************ **
** This file is part of asgrid, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of asgrid is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

use crate::FailResult;

/// A group of command line arguments that knows how to register itself
/// on a clap app and how to read itself back out of the matches.
pub trait CliDeserialize: Sized {
    fn augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> (clap::App<'a, 'b>, ClapDeserializer<Self>)
    {
        let app = Self::_augment_clap_app(app);
        (app, ClapDeserializer(Default::default()))
    }

    /// Call `augment_clap_app` instead.
    fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b>;
    /// Call `resolve_args` on the `ClapDeserializer` instead.
    fn _resolve_args(matches: &clap::ArgMatches<'_>) -> FailResult<Self>;
}

/// Returned by `augment_clap_app`, so that `A` can only be resolved from an
/// app that registered its arguments.
pub struct ClapDeserializer<A>(std::marker::PhantomData<A>);

impl<A: CliDeserialize> ClapDeserializer<A> {
    /// This may perform IO such as reading config files.
    pub fn resolve_args(self, matches: &clap::ArgMatches<'_>) -> FailResult<A>
    { A::_resolve_args(matches) }
}

impl<A, B> CliDeserialize for (A, B)
where
    A: CliDeserialize,
    B: CliDeserialize,
{
    fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b>
    { B::_augment_clap_app(A::_augment_clap_app(app)) }

    fn _resolve_args(matches: &clap::ArgMatches<'_>) -> FailResult<Self>
    { Ok((A::_resolve_args(matches)?, B::_resolve_args(matches)?)) }
}
